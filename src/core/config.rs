//! # Supervisor runtime settings.
//!
//! [`SupervisorConfig`] holds the timing knobs of the supervisor itself. It is
//! distinct from the process-wide [`ConfigStore`](crate::ConfigStore), which
//! holds parameters consumed by services.
//!
//! ## Sentinel values
//! - `startup_grace = 0s` → monitor timers right after spawning workers
//! - `bus_capacity = 0` / `control_capacity = 0` → clamped to 1

use std::time::Duration;

/// Timing and capacity settings for a [`ProcessState`](crate::ProcessState).
///
/// ## Field semantics
/// - `startup_grace`: pause after spawning workers so services can create their timers
/// - `shutdown_timeout`: bound on each `Service::shutdown` call
/// - `join_timeout`: bound on joining each worker during shutdown
/// - `bus_capacity`: event bus ring buffer size
/// - `control_capacity`: queued control signals before senders wait
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    pub startup_grace: Duration,
    pub shutdown_timeout: Duration,
    pub join_timeout: Duration,
    pub bus_capacity: usize,
    pub control_capacity: usize,
}

impl SupervisorConfig {
    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Control channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn control_capacity_clamped(&self) -> usize {
        self.control_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// - `startup_grace = 500ms`
    /// - `shutdown_timeout = 20s`
    /// - `join_timeout = 20s`
    /// - `bus_capacity = 1024`
    /// - `control_capacity = 16`
    fn default() -> Self {
        Self {
            startup_grace: Duration::from_millis(500),
            shutdown_timeout: Duration::from_secs(20),
            join_timeout: Duration::from_secs(20),
            bus_capacity: 1024,
            control_capacity: 16,
        }
    }
}
