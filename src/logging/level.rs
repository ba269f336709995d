//! Syslog-style message levels.

use std::fmt;
use std::str::FromStr;

/// Severity of a log message, lowest first.
///
/// The order follows the sink's filtering rule: a message is emitted when its
/// level is greater than or equal to the sink's current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Notice,
    Warning,
    Err,
    Alert,
    Emerg,
    Crit,
}

impl LogLevel {
    /// All levels in ascending order.
    pub const ALL: [LogLevel; 8] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Notice,
        LogLevel::Warning,
        LogLevel::Err,
        LogLevel::Alert,
        LogLevel::Emerg,
        LogLevel::Crit,
    ];

    /// Lowercase level name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Notice => "notice",
            LogLevel::Warning => "warning",
            LogLevel::Err => "err",
            LogLevel::Alert => "alert",
            LogLevel::Emerg => "emerg",
            LogLevel::Crit => "crit",
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        LogLevel::ALL
            .get(v as usize)
            .copied()
            .unwrap_or(LogLevel::Crit)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown level name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid log level '{0}'")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, <LogLevel as FromStr>::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "error" => return Ok(LogLevel::Err),
            "warn" => return Ok(LogLevel::Warning),
            _ => {}
        }
        LogLevel::ALL
            .into_iter()
            .find(|l| l.as_str() == lower)
            .ok_or(ParseLevelError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Notice < LogLevel::Err);
        assert!(LogLevel::Emerg < LogLevel::Crit);
    }

    #[test]
    fn parse_accepts_names_and_aliases() {
        assert_eq!("notice".parse::<LogLevel>(), Ok(LogLevel::Notice));
        assert_eq!("ERROR".parse::<LogLevel>(), Ok(LogLevel::Err));
        assert_eq!("warn".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn u8_conversion_is_stable() {
        for level in LogLevel::ALL {
            assert_eq!(LogLevel::from_u8(level.as_u8()), level);
        }
    }
}
