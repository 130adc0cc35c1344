//! Fundamental scoring strategies
//!
//! Two interchangeable strategies implement [`ScoringStrategy`]:
//!
//! - [`WeightedScoring`] (default): category sub-scores on a 0-10 scale,
//!   sector-relative where a median exists and absolute otherwise, fused with
//!   the technical call through a fixed compatibility table.
//! - [`SectorComparisonScoring`]: per-metric "better than sector" flags plus
//!   narrative growth/leverage/liquidity bands, fused by counting favourable
//!   indicators.
//!
//! The two disagree on what "good fundamentals" means and neither is treated
//! as canonical; the caller picks one through [`StrategyKind`].

pub mod comparison;
pub mod interpret;
pub mod tiers;
pub mod weighted;

pub use comparison::{GrowthReading, HealthReading, MetricComparison, SectorComparison, SectorComparisonScoring};
pub use tiers::GrowthKind;
pub use weighted::WeightedScoring;

use crate::benchmarks::{BenchmarkMetric, SectorBenchmarks};
use crate::fundamentals::{FundamentalsSnapshot, Metric};
use crate::recommendation::{Ranking, Recommendation, TechnicalCall};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Scoring categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Valuation,
    Profitability,
    Growth,
    FinancialHealth,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Self::Valuation,
        Self::Profitability,
        Self::Growth,
        Self::FinancialHealth,
    ];
}

/// Direction in which a metric improves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    #[serde(rename = "Higher is Better")]
    HigherIsBetter,
    #[serde(rename = "Lower is Better")]
    LowerIsBetter,
}

impl From<BenchmarkMetric> for Polarity {
    fn from(metric: BenchmarkMetric) -> Self {
        if metric.higher_is_better() {
            Self::HigherIsBetter
        } else {
            Self::LowerIsBetter
        }
    }
}

/// Output of [`ScoringStrategy::score_fundamentals`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub strategy: StrategyKind,
    /// 0-10 per category
    pub category_scores: BTreeMap<Category, f64>,
    /// Individual sub-scores behind the categories
    pub metric_scores: BTreeMap<Metric, u8>,
    pub total_score: f64,
    pub ranking: Ranking,
    pub recommendation: Recommendation,
    /// Present for sector-comparison scoring of a non-empty snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<SectorComparison>,
}

/// Scores a fundamentals snapshot and fuses the result with a technical call
pub trait ScoringStrategy: Send + Sync + fmt::Debug {
    fn kind(&self) -> StrategyKind;

    fn score_fundamentals(&self, snapshot: &FundamentalsSnapshot, benchmarks: &SectorBenchmarks) -> ScoreResult;

    fn fuse_recommendation(&self, score: &ScoreResult, technical: TechnicalCall) -> Recommendation;
}

/// Selectable scoring strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Weighted,
    SectorComparison,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weighted => "weighted",
            Self::SectorComparison => "sector_comparison",
        }
    }

    pub fn strategy(&self) -> Box<dyn ScoringStrategy> {
        match self {
            Self::Weighted => Box::new(WeightedScoring),
            Self::SectorComparison => Box::new(SectorComparisonScoring),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown scoring strategy '{0}', expected 'weighted' or 'sector_comparison'")]
pub struct ParseStrategyError(pub String);

impl FromStr for StrategyKind {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "weighted" => Ok(Self::Weighted),
            "sector_comparison" | "comparison" | "simple" => Ok(Self::SectorComparison),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

/// Score with the default strategy
pub fn score_fundamentals(snapshot: &FundamentalsSnapshot, benchmarks: &SectorBenchmarks) -> ScoreResult {
    StrategyKind::default()
        .strategy()
        .score_fundamentals(snapshot, benchmarks)
}

/// Fuse using the strategy that produced `score`
pub fn fuse_recommendation(score: &ScoreResult, technical: TechnicalCall) -> Recommendation {
    score.strategy.strategy().fuse_recommendation(score, technical)
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_kind_parsing() {
        assert_eq!("weighted".parse::<StrategyKind>().unwrap(), StrategyKind::Weighted);
        assert_eq!(
            "Sector-Comparison".parse::<StrategyKind>().unwrap(),
            StrategyKind::SectorComparison
        );
        assert!("magic".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_strategy_dispatch() {
        for kind in [StrategyKind::Weighted, StrategyKind::SectorComparison] {
            assert_eq!(kind.strategy().kind(), kind);
        }
    }

    #[test]
    fn test_fuse_uses_producing_strategy() {
        let table = SectorBenchmarks::fallback();
        let empty = FundamentalsSnapshot::new();

        let weighted = WeightedScoring.score_fundamentals(&empty, &table);
        assert_eq!(fuse_recommendation(&weighted, TechnicalCall::Hold), Recommendation::Sell);

        let comparison = SectorComparisonScoring.score_fundamentals(&empty, &table);
        assert_eq!(fuse_recommendation(&comparison, TechnicalCall::Hold), Recommendation::Hold);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
    }
}
