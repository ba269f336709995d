//! # Service abstractions.
//!
//! - [`Service`] mandatory start/shutdown contract
//! - [`Monitorable`], [`Triggerable`], [`Restartable`] optional capabilities
//! - [`ServiceFn`] closure-backed service
//! - [`ServiceRef`] shared handle (`Arc<dyn Service>`)

mod service;
mod service_fn;

pub use service::{Monitorable, Restartable, Service, ServiceRef, Triggerable};
pub use service_fn::ServiceFn;
