//! Equity analysis engine
//!
//! Pure computation core for evaluating a single stock. It combines:
//!
//! - A technical indicator pipeline (30-day moving average, smoothed
//!   stochastic oscillator, smoothed MACD) over a daily OHLC series
//! - A buy/sell signal generator with a trailing confirmation window
//! - Sector median benchmarks for five core fundamental ratios
//! - Two interchangeable fundamental scoring strategies (weighted category
//!   scoring and sector comparison)
//! - Recommendation fusion of the technical call with the fundamental verdict
//!
//! The engine performs no I/O. Callers fetch price history and fundamentals,
//! hand them in, and get structured scores and signals back. Degraded input
//! (short history, missing metrics, unknown sectors, empty data) always
//! produces a well-defined neutral output instead of an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use equity_engine::{
//!     compute_indicators, generate_signals, technical_call, PriceSeries,
//!     FundamentalsSnapshot, SectorBenchmarks, ScoringStrategy, WeightedScoring,
//! };
//!
//! let indicators = generate_signals(compute_indicators(PriceSeries::new(points)));
//! let call = technical_call(&indicators, 10);
//!
//! let strategy = WeightedScoring::default();
//! let score = strategy.score_fundamentals(&snapshot, &SectorBenchmarks::fallback());
//! let overall = strategy.fuse_recommendation(&score, call);
//! ```

pub mod benchmarks;
pub mod chart;
pub mod fundamentals;
pub mod fusion;
pub mod growth;
pub mod indicators;
pub mod recommendation;
pub mod scoring;
pub mod series;
pub mod signals;

pub use benchmarks::{
    BenchmarkMetadata, BenchmarkMetric, BenchmarkSample, SectorBenchmark, SectorBenchmarkStore,
    SectorBenchmarks, SectorInfo,
};
pub use chart::{ChartData, chart_data};
pub use fundamentals::{FundamentalsSnapshot, Metric};
pub use fusion::{FundamentalVerdict, fuse_score_based, fuse_simple};
pub use growth::{GrowthMetrics, QuarterlyFinancials};
pub use indicators::{
    IndicatorColumns, IndicatorParams, IndicatorPipeline, IndicatorSeries, MIN_HISTORY,
    compute_indicators,
};
pub use recommendation::{Ranking, Recommendation, TechnicalCall};
pub use scoring::{
    Category, GrowthKind, ParseStrategyError, Polarity, ScoreResult, ScoringStrategy,
    SectorComparison, SectorComparisonScoring, StrategyKind, WeightedScoring, fuse_recommendation,
    score_fundamentals,
};
pub use series::{PricePoint, PriceSeries, Series};
pub use signals::{
    CONFIRMATION_WINDOW, SignalColumns, SignalGenerator, generate_signals, technical_call,
};
