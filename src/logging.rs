//! Subscriber setup for applications and tests.
//!
//! The library itself only emits `tracing` events. [`init_with_config`]
//! installs a `tracing-subscriber` fmt layer for callers that do not bring
//! their own subscriber; `Library::setup` calls it when the config carries
//! logging settings.
//!
//! Environment:
//!
//! - `RUST_LOG` overrides the configured level with full filter directives
//! - `COBALT_LOG_LEVEL`: `off`, `error`, `warn`, `info`, `debug` or `trace`
//! - `COBALT_LOG_FORMAT`: `human` (default) or `json`

use std::str::FromStr;

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INSTALLED: OnceCell<()> = OnceCell::new();

const LEVEL_VAR: &str = "COBALT_LOG_LEVEL";
const FORMAT_VAR: &str = "COBALT_LOG_FORMAT";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter {directives:?}: {reason}")]
    InvalidFilter { directives: String, reason: String },

    #[error("a global tracing subscriber is already installed")]
    AlreadySet,
}

/// Output encoding of the installed fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("human") || s.eq_ignore_ascii_case("pretty") {
            Ok(LogFormat::Human)
        } else if s.eq_ignore_ascii_case("json") {
            Ok(LogFormat::Json)
        } else {
            Err(format!("unknown log format {s:?}"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Used when `RUST_LOG` is unset.
    pub level: LevelFilter,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
            format: LogFormat::Human,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(self, level: LevelFilter) -> Self {
        Self { level, ..self }
    }

    pub fn with_format(self, format: LogFormat) -> Self {
        Self { format, ..self }
    }

    /// Defaults overridden by `COBALT_LOG_LEVEL` and `COBALT_LOG_FORMAT`.
    /// Values that do not parse are ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            level: env_parsed(LEVEL_VAR).unwrap_or(defaults.level),
            format: env_parsed(FORMAT_VAR).unwrap_or(defaults.format),
        }
    }
}

fn env_parsed<T: FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok()?.trim().parse().ok()
}

/// [`init_with_config`] with [`LoggingConfig::from_env`].
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    init_with_config(&LoggingConfig::from_env())
}

/// Install the global subscriber. Only the first successful call does
/// anything; later calls return `Ok(())`.
pub fn init_with_config(config: &LoggingConfig) -> Result<(), LoggingError> {
    INSTALLED.get_or_try_init(|| install(config)).map(|_| ())
}

fn install(config: &LoggingConfig) -> Result<(), LoggingError> {
    let registry = tracing_subscriber::registry().with(filter(config.level)?);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init(),
        LogFormat::Human => registry.with(fmt::layer().with_thread_names(true)).try_init(),
    };
    installed.map_err(|_| LoggingError::AlreadySet)
}

fn filter(level: LevelFilter) -> Result<EnvFilter, LoggingError> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter {
            reason: e.to_string(),
            directives,
        }),
        Err(_) => Ok(EnvFilter::new(level.to_string())),
    }
}
