//! Tracing subscriber set-up.

use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::error::{CliError, CliResult};

/// Logging configuration, initialised once at start-up.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level used when neither `env_filter` nor `RUST_LOG` is set.
    pub level:       Level,
    pub json_format: bool,
    pub enable_ansi: bool,
    /// Explicit filter directives; take precedence over `RUST_LOG`.
    pub env_filter:  Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: Level::WARN, json_format: false, enable_ansi: true, env_filter: None }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_json_format(mut self) -> Self {
        self.json_format = true;
        self
    }

    pub fn without_ansi(mut self) -> Self {
        self.enable_ansi = false;
        self
    }

    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Resolve the filter: explicit directives, then `RUST_LOG`, then the
    /// configured level.
    pub fn filter(&self) -> CliResult<EnvFilter> {
        match &self.env_filter {
            Some(directives) => EnvFilter::try_new(directives).map_err(|e| CliError::Logging(e.to_string())),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.level.as_str().to_ascii_lowercase()))),
        }
    }

    /// Install the global subscriber, writing to stderr.
    pub fn init(self) -> CliResult<()> {
        let filter = self.filter()?;
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true);

        let result = if self.json_format {
            builder.json().try_init()
        } else {
            builder.with_ansi(self.enable_ansi).try_init()
        };
        result.map_err(|e| CliError::Logging(e.to_string()))
    }
}
