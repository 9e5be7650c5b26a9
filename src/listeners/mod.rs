//! # Event Listeners
//!
//! Asynchronous consumers translating bus events into lifecycle manager
//! calls. Listeners always re-read the entity from its store before acting and
//! rely on the lifecycle managers for per-entity serialization.

pub mod run_operations_listener;
pub mod runnable_listener;
pub mod trigger_listener;

pub use run_operations_listener::RunOperationsListener;
pub use runnable_listener::RunnableListener;
pub use trigger_listener::TriggerListener;

use crate::error::Result;
use crate::events::BusEvent;
use async_trait::async_trait;

/// Consumer registered with the [`EventRouter`](crate::events::EventRouter)
#[async_trait]
pub trait EventListener: Send + Sync {
    /// Listener name for logging
    fn name(&self) -> &'static str;

    /// Cheap filter evaluated before `handle`
    fn accepts(&self, event: &BusEvent) -> bool;

    async fn handle(&self, event: &BusEvent) -> Result<()>;
}
