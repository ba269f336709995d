//! Error types used by the procvisor runtime, services and the configuration store.
//!
//! - [`RuntimeError`] — errors raised by the supervisor itself.
//! - [`ServiceError`] — errors raised by service code (start, shutdown, triggered runs).
//! - [`ConfigError`] — errors raised by configuration access; always propagated to the caller.
//! - [`FsError`] — errors raised by the filesystem helper.
//!
//! All of them provide `as_label` for logs/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the procvisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Every registered service failed to start.
    #[error("no remaining services")]
    NoRemainingServices,

    /// Timer parameters failed validation.
    #[error("invalid timer: {reason}")]
    InvalidTimer {
        /// What was wrong with the parameters.
        reason: String,
    },

    /// Re-executing the process failed (the process keeps running).
    #[error("could not relaunch '{command}': {source}")]
    Relaunch {
        /// Command line that was attempted.
        command: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// OS signal listeners could not be installed.
    #[error("could not install signal handlers: {0}")]
    SignalSetup(#[source] std::io::Error),

    /// Configuration access failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Writing generated configuration failed.
    #[error("could not write configuration: {0}")]
    Output(#[source] std::io::Error),

    /// The control plane is gone; the signal was not delivered.
    #[error("control channel closed")]
    ControlClosed,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use procvisor::RuntimeError;
    ///
    /// assert_eq!(RuntimeError::NoRemainingServices.as_label(), "runtime_no_remaining_services");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NoRemainingServices => "runtime_no_remaining_services",
            RuntimeError::InvalidTimer { .. } => "runtime_invalid_timer",
            RuntimeError::Relaunch { .. } => "runtime_relaunch_failed",
            RuntimeError::SignalSetup(_) => "runtime_signal_setup",
            RuntimeError::Config(_) => "runtime_config",
            RuntimeError::Output(_) => "runtime_output",
            RuntimeError::ControlClosed => "runtime_control_closed",
        }
    }

    /// Process exit code associated with this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// # Errors produced by service code.
///
/// Returned from [`Service::start`](crate::Service::start),
/// [`Service::shutdown`](crate::Service::shutdown) and the optional capabilities.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The operation did not finish within its bound.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The bound that was exceeded.
        timeout: Duration,
    },

    /// The operation failed.
    #[error("{error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The operation observed cancellation and stopped early.
    #[error("context cancelled")]
    Canceled,

    /// Service code panicked; the panic was caught by the supervisor.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl ServiceError {
    /// Shorthand for [`ServiceError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        ServiceError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use procvisor::ServiceError;
    /// use std::time::Duration;
    ///
    /// let err = ServiceError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "service_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Timeout { .. } => "service_timeout",
            ServiceError::Fail { .. } => "service_failed",
            ServiceError::Canceled => "service_canceled",
            ServiceError::Panicked { .. } => "service_panicked",
        }
    }

    /// Builds a [`ServiceError::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let info = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        ServiceError::Panicked { info }
    }
}

/// # Errors produced by configuration access.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// No parameter with this name was ever defined.
    #[error("unknown configuration parameter '{0}'")]
    UnknownParameter(String),

    /// A parameter was defined twice via `set_defaults`.
    #[error("parameter '{name}' is already defined in section '{section}'")]
    DuplicateParameter {
        /// Parameter name.
        name: String,
        /// Section holding the first definition.
        section: String,
    },

    /// The value has a different type than the parameter's default.
    #[error("parameter '{name}' expects {expected}, got {got}")]
    TypeMismatch {
        /// Parameter name.
        name: String,
        /// Type of the default.
        expected: &'static str,
        /// Type of the rejected value.
        got: &'static str,
    },

    /// A string could not be converted to the parameter's type.
    #[error("invalid value '{value}' for parameter '{name}'")]
    InvalidValue {
        /// Parameter name.
        name: String,
        /// Rejected input.
        value: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::UnknownParameter(_) => "config_unknown_parameter",
            ConfigError::DuplicateParameter { .. } => "config_duplicate_parameter",
            ConfigError::TypeMismatch { .. } => "config_type_mismatch",
            ConfigError::InvalidValue { .. } => "config_invalid_value",
        }
    }
}

/// # Errors produced by [`mkdir_p`](crate::fs::mkdir_p).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FsError {
    /// An intermediate path component exists and is not a directory.
    #[error("cannot create {dir}: basedir {basedir} is a file")]
    NotADirectory {
        /// Directory that was requested.
        dir: String,
        /// Offending component.
        basedir: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_render_as_text() {
        let err = ServiceError::from_panic(Box::new("boom"));
        assert_eq!(err.to_string(), "panicked: boom");

        let err = ServiceError::from_panic(Box::new(String::from("owned boom")));
        assert_eq!(err.to_string(), "panicked: owned boom");

        let err = ServiceError::from_panic(Box::new(42_u8));
        assert_eq!(err.to_string(), "panicked: unknown panic");
    }

    #[test]
    fn no_remaining_services_exits_with_one() {
        assert_eq!(RuntimeError::NoRemainingServices.exit_code(), 1);
    }

    #[test]
    fn config_errors_carry_parameter_name() {
        let err = ConfigError::UnknownParameter("nosuch".into());
        assert_eq!(err.to_string(), "unknown configuration parameter 'nosuch'");
        assert_eq!(err.as_label(), "config_unknown_parameter");
    }
}
