//! Tracing subscriber configuration

use serde::{Deserialize, Serialize};

use super::environment::Environment;

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,

    pub format: LogFormat,

    /// ANSI colors (ignored for json)
    pub colored: bool,

    /// Emit file and line of each event
    pub source_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl LoggingConfig {
    /// Readable output in development, json with lifecycle events elsewhere
    pub fn for_environment(environment: Environment) -> Self {
        let (level, format) = match environment {
            Environment::Development => ("debug,sqlx=warn", LogFormat::Pretty),
            Environment::Staging => ("info", LogFormat::Json),
            Environment::Production => ("info,sqlx=warn", LogFormat::Json),
        };
        let interactive = format != LogFormat::Json;

        Self {
            level: level.to_string(),
            format,
            colored: interactive,
            source_location: interactive,
        }
    }
}
