//! Error types for the service layer

use thiserror::Error;

/// Failures surfaced by providers, stores and the analysis service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Upstream data provider failed for a symbol
    #[error("Upstream failure for {symbol}: {reason}")]
    Upstream { symbol: String, reason: String },

    /// Rate limit reported by a provider
    #[error("Rate limit exceeded for {provider}")]
    RateLimited { provider: String },

    /// Symbol is empty or unknown to the provider
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("{0} is not in the portfolio")]
    NotInPortfolio(String),

    #[error("{0} is already in the portfolio")]
    AlreadyInPortfolio(String),

    /// Nothing to render or score for a symbol
    #[error("No data available for {0}")]
    NoData(String),

    /// Persistent store could not be read or written
    #[error("Storage error at {path}: {reason}")]
    Storage { path: String, reason: String },

    /// No sector produced live medians during a benchmark run
    #[error("Insufficient benchmark data: {0}")]
    InsufficientBenchmarkData(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ServiceError {
    pub fn upstream(symbol: impl Into<String>, reason: impl ToString) -> Self {
        Self::Upstream {
            symbol: symbol.into(),
            reason: reason.to_string(),
        }
    }

    /// Transient failures worth retrying later; a cached value may stand in
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream { .. } | Self::RateLimited { .. } | Self::Network(_))
    }
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServiceError::InvalidSymbol("ZZZZ".to_string());
        assert_eq!(err.to_string(), "Invalid symbol: ZZZZ");

        let err = ServiceError::upstream("AAPL", "timed out");
        assert_eq!(err.to_string(), "Upstream failure for AAPL: timed out");

        let err = ServiceError::NotInPortfolio("MSFT".to_string());
        assert_eq!(err.to_string(), "MSFT is not in the portfolio");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ServiceError::upstream("AAPL", "503").is_retryable());
        assert!(
            ServiceError::RateLimited {
                provider: "Alpha Vantage".to_string()
            }
            .is_retryable()
        );
        assert!(!ServiceError::InvalidSymbol("X".to_string()).is_retryable());
        assert!(!ServiceError::Config("bad".to_string()).is_retryable());
    }

    #[test]
    fn test_json_conversion() {
        let err: ServiceError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ServiceError::Json(_)));
    }
}
