//! # Lifecycle Management
//!
//! The single serialization point for run and trigger mutations. Each
//! operation takes the entity's lock, re-reads the persisted entity, performs
//! one state machine transition, merges the resulting status and persists it.
//! Events produced by the transition are published once the lock is released.

pub mod lock;
pub mod manager;
pub mod run_lifecycle;
pub mod trigger_lifecycle;

pub use lock::{EntityLock, EntityLockGuard, EntityLocks};
pub use manager::LifecycleManager;
pub use run_lifecycle::RunLifecycleManager;
pub use trigger_lifecycle::TriggerLifecycleManager;
