//! Process-level configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Log line encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Error)]
#[error("unknown log format `{0}` (expected `pretty` or `json`)")]
pub struct ParseLogFormatError(String);

impl FromStr for LogFormat {
    type Err = ParseLogFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ParseLogFormatError(s.to_string())),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        })
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, ...)
    pub environment: String,
    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "equity-rs".to_string(),
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Read `EQUITY_ENV`, `EQUITY_LOG_LEVEL` and `EQUITY_LOG_FORMAT`
    pub fn from_env() -> Result<Self, ParseLogFormatError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ParseLogFormatError> {
        let mut config = Self::default();
        if let Some(environment) = lookup("EQUITY_ENV") {
            config.environment = environment;
        }
        if let Some(level) = lookup("EQUITY_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(format) = lookup("EQUITY_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }
        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
