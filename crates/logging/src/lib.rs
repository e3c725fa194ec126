//! RewardTree Logging
//!
//! Logging setup for the `rewardtree` binary and integration tests.
//! Output goes to stderr so stdout stays free for roots and JSON.
//!
//! ## Usage
//!
//! ```no_run
//! use rewardtree_logging::{try_init, LogLevel};
//!
//! // -v on the command line maps to Debug, -vv to Trace
//! try_init(LogLevel::from_verbosity(1)).ok();
//! ```

use tracing_subscriber::EnvFilter;

/// Log level for the application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    /// Default
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Create a log level from a verbosity count
    ///
    /// - `0` → `Info`
    /// - `1` → `Debug`
    /// - `2+` → `Trace`
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::Info,
            1 => Self::Debug,
            _ => Self::Trace,
        }
    }

    /// Quiet mode only reports errors
    pub fn from_quiet(quiet: bool, verbosity: u8) -> Self {
        if quiet {
            Self::Error
        } else {
            Self::from_verbosity(verbosity)
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Build the filter: `RUST_LOG` wins over `level` when set.
fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber, failing if one is already set.
pub fn try_init(level: LogLevel) -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| e.to_string())
}

/// Initialize logging for tests (captures output for test framework).
/// Safe to call from every test.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_verbosity() {
        assert_eq!(LogLevel::from_verbosity(0), LogLevel::Info);
        assert_eq!(LogLevel::from_verbosity(1), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(2), LogLevel::Trace);
        assert_eq!(LogLevel::from_verbosity(10), LogLevel::Trace);
    }

    #[test]
    fn test_quiet_overrides_verbosity() {
        assert_eq!(LogLevel::from_quiet(true, 2), LogLevel::Error);
        assert_eq!(LogLevel::from_quiet(false, 1), LogLevel::Debug);
    }

    #[test]
    fn test_log_level_as_str() {
        assert_eq!(LogLevel::Error.as_str(), "error");
        assert_eq!(LogLevel::Warn.as_str(), "warn");
        assert_eq!(LogLevel::Info.as_str(), "info");
        assert_eq!(LogLevel::Debug.as_str(), "debug");
        assert_eq!(LogLevel::Trace.as_str(), "trace");
    }

    #[test]
    fn test_init_test_is_idempotent() {
        init_test();
        init_test();
        assert!(try_init(LogLevel::Info).is_err());
    }
}
