//! # Registry Infrastructure
//!
//! Kind-keyed lookups resolved once per operation by the lifecycle managers.
//!
//! ## Available Registries
//!
//! - **RuntimeFactory**: run kind prefix -> [`Runtime`](crate::runtime::Runtime)
//! - **ActuatorFactory**: trigger kind -> [`Actuator`](crate::runtime::Actuator)
//! - **ProcessorRegistry**: stage key -> ordered post-transition processors
//!
//! Registration happens at start-up; an unknown kind is an invalid argument
//! for the single operation that asked for it.

pub mod collaborator_factory;
pub mod processor_registry;

pub use collaborator_factory::{ActuatorFactory, RuntimeFactory};
pub use processor_registry::ProcessorRegistry;
