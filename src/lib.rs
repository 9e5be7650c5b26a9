#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Runplane Core
//!
//! Lifecycle control plane for data-science runs and the triggers that
//! produce them.
//!
//! ## Overview
//!
//! A caller requests a state change (build, run, stop, resume, delete) on a
//! run or trigger. The lifecycle manager takes the entity's lock, a state
//! machine built on the persisted state performs the transition through the
//! kind-specific runtime or actuator, post-transition processors contribute
//! status fragments, and the merged status is persisted. Runnables produced by
//! the transition go out on the event bus, where framework dispatch executes
//! them and reports observed states back to the run listeners.
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Generic transition engine plus run and trigger machines
//! - [`lifecycle`] - Entity locks and the run/trigger lifecycle managers
//! - [`events`] - Typed bus events, sharded publisher and router
//! - [`listeners`] - Bus consumers driving lifecycle managers
//! - [`framework`] - Execution framework contract, dispatch and monitoring
//! - [`processors`] - Post-transition status processors
//! - [`registry`] - Kind-keyed runtime, actuator and processor lookup
//! - [`services`] - Entity store contract and in-memory store
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use runplane_core::bootstrap::{Collaborators, LifecycleSystem};
//! use runplane_core::config::ConfigManager;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! runplane_core::logging::init_structured_logging(&manager.config().logging);
//!
//! let system =
//!     LifecycleSystem::bootstrap(manager.config().clone(), Collaborators::default()).await?;
//! // register runtimes/frameworks through `Collaborators` and drive runs via
//! // `system.run_manager()`
//! system.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod framework;
pub mod lifecycle;
pub mod listeners;
pub mod logging;
pub mod models;
pub mod processors;
pub mod registry;
pub mod runtime;
pub mod services;
pub mod state_machine;

pub use bootstrap::{Collaborators, LifecycleSystem};
pub use config::{ConfigManager, RunplaneConfig};
pub use error::{Result, RunplaneError};
pub use lifecycle::{RunLifecycleManager, TriggerLifecycleManager};
pub use models::{Run, Runnable, Status, Task, Trigger};
pub use state_machine::State;
