//! Logging setup for the driver process
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the binary (or to an embedding application).

use tracing_subscriber::{fmt, EnvFilter, Registry};

pub const ENV_LOG_MODE: &str = "SONOS_DRIVER_LOG_MODE";
pub const ENV_LOG_LEVEL: &str = "SONOS_DRIVER_LOG_LEVEL";

/// How much the process writes to stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber is installed
    Silent,
    /// Compact lines at `info`
    Development,
    /// Pretty output with thread ids and source locations at `debug`
    Debug,
}

impl LoggingMode {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "silent" => Some(Self::Silent),
            "development" => Some(Self::Development),
            "debug" => Some(Self::Debug),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid environment variable: {0}")]
    InvalidEnv(String),
}

/// Install the global subscriber for `mode`.
///
/// The filter comes from `SONOS_DRIVER_LOG_LEVEL`, then `RUST_LOG`, then the
/// mode's default level.
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let filter = create_env_filter("info")?;

            Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .compact(),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let filter = create_env_filter("debug")?;

            Registry::default()
                .with(
                    fmt::layer()
                        .pretty()
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Install the subscriber selected by `SONOS_DRIVER_LOG_MODE`
/// (`silent`, `development` or `debug`). Unset means `development`.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    init_logging(mode_from(std::env::var(ENV_LOG_MODE).ok())?)
}

fn mode_from(value: Option<String>) -> Result<LoggingMode, LoggingError> {
    match value {
        None => Ok(LoggingMode::Development),
        Some(name) => LoggingMode::from_name(&name)
            .ok_or_else(|| LoggingError::InvalidEnv(format!("{ENV_LOG_MODE}={name}"))),
    }
}

fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var(ENV_LOG_LEVEL)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());

    EnvFilter::try_new(&directives)
        .map_err(|e| LoggingError::InvalidEnv(format!("log filter '{directives}': {e}")))
}

pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_mode() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(mode_from(None).unwrap(), LoggingMode::Development);
        assert_eq!(mode_from(Some("silent".into())).unwrap(), LoggingMode::Silent);
        assert_eq!(mode_from(Some("Debug".into())).unwrap(), LoggingMode::Debug);
        assert!(matches!(
            mode_from(Some("loud".into())),
            Err(LoggingError::InvalidEnv(_))
        ));
    }
}
