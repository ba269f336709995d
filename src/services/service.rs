//! # Service contract and optional capabilities.
//!
//! Every service implements [`Service`] (`start` + `shutdown`). Two optional
//! sub-interfaces are exposed by overriding the accessor methods rather than
//! discovered at runtime:
//!
//! ```text
//! Service ─┬─ as_triggerable() ─► Some(&dyn Triggerable)   is_running + run_now   (USR1)
//!          └─ as_restartable() ─► Some(&dyn Restartable)   is_running + restart   (HUP)
//! ```
//!
//! # Example
//! ```
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use async_trait::async_trait;
//! use tokio::time::Instant;
//! use tokio_util::sync::CancellationToken;
//! use procvisor::{Monitorable, Service, ServiceError, Triggerable};
//!
//! #[derive(Default)]
//! struct Agent {
//!     busy: AtomicBool,
//!     stop: CancellationToken,
//! }
//!
//! #[async_trait]
//! impl Service for Agent {
//!     fn name(&self) -> &str { "agent" }
//!
//!     async fn start(&self, ctx: CancellationToken) -> Result<(), ServiceError> {
//!         tokio::select! {
//!             _ = ctx.cancelled() => {}
//!             _ = self.stop.cancelled() => {}
//!         }
//!         Ok(())
//!     }
//!
//!     async fn shutdown(&self, _deadline: Instant) -> Result<(), ServiceError> {
//!         self.stop.cancel();
//!         Ok(())
//!     }
//!
//!     fn as_triggerable(&self) -> Option<&dyn Triggerable> { Some(self) }
//! }
//!
//! impl Monitorable for Agent {
//!     fn is_running(&self) -> bool { self.busy.load(Ordering::Acquire) }
//! }
//!
//! #[async_trait]
//! impl Triggerable for Agent {
//!     async fn run_now(&self) -> Result<(), ServiceError> {
//!         self.busy.store(true, Ordering::Release);
//!         // one unit of work...
//!         self.busy.store(false, Ordering::Release);
//!         Ok(())
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;

/// Long-running unit of work owned by the supervisor.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Stable, human-readable name used in logs and events.
    fn name(&self) -> &str;

    /// Runs for the service's lifetime.
    ///
    /// Called once, on the service's own worker. Returning `Err` early means
    /// the service failed to start and it is dropped from the registry.
    /// `ctx` is cancelled during shutdown's join phase.
    async fn start(&self, ctx: CancellationToken) -> Result<(), ServiceError>;

    /// Stops the service.
    ///
    /// Should return before `deadline`; the supervisor abandons the call once
    /// it passes.
    async fn shutdown(&self, deadline: Instant) -> Result<(), ServiceError>;

    /// Exposes the trigger-now capability.
    fn as_triggerable(&self) -> Option<&dyn Triggerable> {
        None
    }

    /// Exposes the self-restart capability.
    fn as_restartable(&self) -> Option<&dyn Restartable> {
        None
    }
}

/// Services that can report whether a unit of work is in progress.
pub trait Monitorable: Send + Sync {
    fn is_running(&self) -> bool;
}

/// Services that can run one unit of work on demand.
#[async_trait]
pub trait Triggerable: Monitorable {
    /// Performs one immediate run; blocks until it is done.
    async fn run_now(&self) -> Result<(), ServiceError>;
}

/// Services that can restart themselves without restarting the process.
#[async_trait]
pub trait Restartable: Monitorable {
    async fn restart(&self) -> Result<(), ServiceError>;
}

/// Shared handle to a service.
pub type ServiceRef = Arc<dyn Service>;
