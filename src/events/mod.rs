//! # Lifecycle Event Bus
//!
//! Typed events exchanged between lifecycle managers, listeners and framework
//! dispatch. Publication never blocks on a handler except when the target
//! shard is saturated, in which case the publisher handles the event itself.

pub mod publisher;
pub mod router;
pub mod types;

// Re-export key types for convenience
pub use publisher::{EventPublisher, EventPublisherStats, ShardReceiver};
pub use router::EventRouter;
pub use types::{
    BusEvent, EntityAction, EntityChangedEvent, EntityOperation, RunnableChangedEvent,
    TriggerExecutionEvent,
};
