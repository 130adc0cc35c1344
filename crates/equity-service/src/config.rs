//! Configuration for the analysis service

use crate::error::{Result, ServiceError};
use equity_engine::StrategyKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for data fetching, caching and persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// How long fetched market data stays fresh
    pub cache_ttl: Duration,

    /// Calendar days of daily history requested per symbol
    pub history_days: u32,

    /// Trailing sessions tallied for the technical call
    pub technical_window: usize,

    /// Sector benchmark table on disk
    pub benchmarks_path: PathBuf,

    /// Portfolio list on disk
    pub portfolio_path: PathBuf,

    /// Fundamental scoring strategy
    pub strategy: StrategyKind,

    /// Alpha Vantage API key; fundamentals are unavailable without one
    pub alpha_vantage_api_key: Option<String>,

    /// Alpha Vantage requests per minute
    pub rate_limit_per_minute: u32,

    /// Valid companies a sector needs before its medians are trusted
    pub min_valid_stocks: usize,

    /// HTTP request timeout
    pub request_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            history_days: 300,
            technical_window: 10,
            benchmarks_path: PathBuf::from("sector_benchmarks.json"),
            portfolio_path: PathBuf::from("portfolio.json"),
            strategy: StrategyKind::default(),
            alpha_vantage_api_key: None,
            rate_limit_per_minute: 5,
            min_valid_stocks: 3,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ServiceConfig {
    /// Create a new configuration builder
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Defaults overlaid with `EQUITY_*` variables and `ALPHA_VANTAGE_API_KEY`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable name
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::builder();

        if let Some(secs) = parse_var::<u64>(&lookup, "EQUITY_CACHE_TTL_SECS")? {
            builder = builder.cache_ttl(Duration::from_secs(secs));
        }
        if let Some(days) = parse_var(&lookup, "EQUITY_HISTORY_DAYS")? {
            builder = builder.history_days(days);
        }
        if let Some(window) = parse_var(&lookup, "EQUITY_TECHNICAL_WINDOW")? {
            builder = builder.technical_window(window);
        }
        if let Some(path) = lookup("EQUITY_BENCHMARKS_PATH") {
            builder = builder.benchmarks_path(path);
        }
        if let Some(path) = lookup("EQUITY_PORTFOLIO_PATH") {
            builder = builder.portfolio_path(path);
        }
        if let Some(strategy) = lookup("EQUITY_STRATEGY") {
            let kind = strategy
                .parse::<StrategyKind>()
                .map_err(|e| ServiceError::Config(e.to_string()))?;
            builder = builder.strategy(kind);
        }
        if let Some(limit) = parse_var(&lookup, "EQUITY_RATE_LIMIT")? {
            builder = builder.rate_limit_per_minute(limit);
        }
        if let Some(min) = parse_var(&lookup, "EQUITY_MIN_VALID_STOCKS")? {
            builder = builder.min_valid_stocks(min);
        }
        if let Some(key) = lookup("ALPHA_VANTAGE_API_KEY").filter(|k| !k.trim().is_empty()) {
            builder = builder.alpha_vantage_api_key(key);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl.is_zero() {
            return Err(ServiceError::Config("cache_ttl must be greater than 0".to_string()));
        }
        if self.history_days == 0 {
            return Err(ServiceError::Config("history_days must be greater than 0".to_string()));
        }
        if self.technical_window == 0 {
            return Err(ServiceError::Config(
                "technical_window must be greater than 0".to_string(),
            ));
        }
        if self.rate_limit_per_minute == 0 {
            return Err(ServiceError::Config(
                "rate_limit_per_minute must be greater than 0".to_string(),
            ));
        }
        if self.min_valid_stocks == 0 {
            return Err(ServiceError::Config(
                "min_valid_stocks must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>> {
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ServiceError::Config(format!("{name} has an invalid value '{raw}'")))
        })
        .transpose()
}

/// Builder for ServiceConfig
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    cache_ttl: Option<Duration>,
    history_days: Option<u32>,
    technical_window: Option<usize>,
    benchmarks_path: Option<PathBuf>,
    portfolio_path: Option<PathBuf>,
    strategy: Option<StrategyKind>,
    alpha_vantage_api_key: Option<String>,
    rate_limit_per_minute: Option<u32>,
    min_valid_stocks: Option<usize>,
    request_timeout: Option<Duration>,
}

impl ServiceConfigBuilder {
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn history_days(mut self, days: u32) -> Self {
        self.history_days = Some(days);
        self
    }

    pub fn technical_window(mut self, window: usize) -> Self {
        self.technical_window = Some(window);
        self
    }

    pub fn benchmarks_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.benchmarks_path = Some(path.into());
        self
    }

    pub fn portfolio_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.portfolio_path = Some(path.into());
        self
    }

    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn alpha_vantage_api_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    pub fn rate_limit_per_minute(mut self, limit: u32) -> Self {
        self.rate_limit_per_minute = Some(limit);
        self
    }

    pub fn min_valid_stocks(mut self, min: usize) -> Self {
        self.min_valid_stocks = Some(min);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<ServiceConfig> {
        let defaults = ServiceConfig::default();

        let config = ServiceConfig {
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            history_days: self.history_days.unwrap_or(defaults.history_days),
            technical_window: self.technical_window.unwrap_or(defaults.technical_window),
            benchmarks_path: self.benchmarks_path.unwrap_or(defaults.benchmarks_path),
            portfolio_path: self.portfolio_path.unwrap_or(defaults.portfolio_path),
            strategy: self.strategy.unwrap_or(defaults.strategy),
            alpha_vantage_api_key: self.alpha_vantage_api_key,
            rate_limit_per_minute: self.rate_limit_per_minute.unwrap_or(defaults.rate_limit_per_minute),
            min_valid_stocks: self.min_valid_stocks.unwrap_or(defaults.min_valid_stocks),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.history_days, 300);
        assert_eq!(config.technical_window, 10);
        assert_eq!(config.strategy, StrategyKind::Weighted);
        assert_eq!(config.min_valid_stocks, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ServiceConfig::builder()
            .history_days(120)
            .strategy(StrategyKind::SectorComparison)
            .portfolio_path("/tmp/p.json")
            .build()
            .unwrap();

        assert_eq!(config.history_days, 120);
        assert_eq!(config.strategy, StrategyKind::SectorComparison);
        assert_eq!(config.portfolio_path, PathBuf::from("/tmp/p.json"));
        assert_eq!(config.technical_window, 10);
    }

    #[test]
    fn test_validation_rejects_zeroes() {
        assert!(ServiceConfig::builder().cache_ttl(Duration::ZERO).build().is_err());
        assert!(ServiceConfig::builder().history_days(0).build().is_err());
        assert!(ServiceConfig::builder().technical_window(0).build().is_err());
    }

    #[test]
    fn test_from_lookup_overlays_defaults() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("EQUITY_CACHE_TTL_SECS", "60"),
            ("EQUITY_STRATEGY", "sector-comparison"),
            ("ALPHA_VANTAGE_API_KEY", "demo"),
        ]))
        .unwrap();

        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.strategy, StrategyKind::SectorComparison);
        assert_eq!(config.alpha_vantage_api_key.as_deref(), Some("demo"));
        assert_eq!(config.history_days, 300);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = ServiceConfig::from_lookup(lookup_from(&[("EQUITY_HISTORY_DAYS", "lots")])).unwrap_err();
        assert!(err.to_string().contains("EQUITY_HISTORY_DAYS"));

        assert!(ServiceConfig::from_lookup(lookup_from(&[("EQUITY_STRATEGY", "vibes")])).is_err());
    }
}
