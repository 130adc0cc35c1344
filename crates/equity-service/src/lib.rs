//! Equity analysis service
//!
//! Wraps the pure `equity-engine` with everything that touches the outside
//! world:
//!
//! - Market data providers (Yahoo Finance price history and symbol lookup,
//!   Alpha Vantage fundamentals and quarterly statements) behind the
//!   [`MarketDataProvider`] trait
//! - A per-symbol, single-flight cache with stale fallback on upstream errors
//! - JSON persistence for the portfolio and the sector benchmark table
//! - Sector benchmark recomputation over representative companies
//! - [`AnalysisService`], which ties these together into request-level
//!   operations
//!
//! # Example
//!
//! ```rust,ignore
//! use equity_service::{AnalysisService, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> equity_service::Result<()> {
//!     let service = AnalysisService::from_config(ServiceConfig::from_env()?).await?;
//!     let report = service.analyze("AAPL").await?;
//!     println!("{}", report.overall_recommendation);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod portfolio;
pub mod provider;
pub mod refresh;
pub mod report;
pub mod service;
pub mod store;

pub use cache::{CachedValue, Freshness, SymbolCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use error::{Result, ServiceError};
pub use portfolio::{PortfolioEntry, PortfolioStore};
pub use provider::{LiveProvider, MarketDataProvider};
pub use report::{BenchmarkData, BenchmarkStatus, RefreshSummary, RepresentativeStocks, StockReport};
pub use service::{AnalysisService, SymbolData};
pub use store::{BenchmarkFile, FileStatus};
