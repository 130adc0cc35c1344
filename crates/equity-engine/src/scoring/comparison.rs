use super::interpret::{debt_interpretation, growth_interpretation, liquidity_interpretation};
use super::tiers::GrowthKind;
use super::{Polarity, ScoreResult, ScoringStrategy, StrategyKind};
use crate::benchmarks::{BenchmarkMetric, SectorBenchmarks};
use crate::fundamentals::{FundamentalsSnapshot, Metric};
use crate::fusion::{FundamentalVerdict, fuse_simple};
use crate::recommendation::{Ranking, Recommendation, TechnicalCall};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Sector assumed for a snapshot that does not report one
pub const DEFAULT_SECTOR: &str = "Technology";

/// Growth at or above this rate counts as strong
pub const STRONG_GROWTH: f64 = 0.05;

/// Company value against its sector median for one ratio
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricComparison {
    pub metric: BenchmarkMetric,
    pub label: &'static str,
    pub company_value: f64,
    pub sector_median: f64,
    pub comparison: Polarity,
    pub better_than_sector: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthReading {
    pub kind: GrowthKind,
    pub label: &'static str,
    pub value: f64,
    pub interpretation: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReading {
    pub metric: Metric,
    pub label: &'static str,
    pub value: f64,
    pub interpretation: &'static str,
}

/// Narrative comparison of a company against its sector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorComparison {
    pub sector_name: String,
    pub metrics: Vec<MetricComparison>,
    pub growth: Vec<GrowthReading>,
    pub financial_health: Vec<HealthReading>,
    pub verdict: FundamentalVerdict,
}

impl SectorComparison {
    pub fn sector_positives(&self) -> usize {
        self.metrics.iter().filter(|m| m.better_than_sector).count()
    }

    pub fn growth_positives(&self) -> usize {
        self.growth.iter().filter(|g| g.value >= STRONG_GROWTH).count()
    }
}

fn label(metric: BenchmarkMetric) -> &'static str {
    match metric {
        BenchmarkMetric::PeRatio => "Price-to-Earnings Ratio",
        BenchmarkMetric::PriceToBook => "Price-to-Book Ratio",
        BenchmarkMetric::PriceToSales => "Price-to-Sales Ratio",
        BenchmarkMetric::ReturnOnEquity => "Return on Equity",
        BenchmarkMetric::ProfitMargin => "Profit Margin",
    }
}

/// Sector-comparison scoring
///
/// Reports, for each core ratio present on both sides with a non-zero value,
/// whether the company beats its sector median, together with narrative
/// bands for growth and balance-sheet ratios. Nothing is scored numerically:
/// category scores stay empty and the total is 0. The verdict maps to a
/// ranking (strong: good, decent: average, weak: poor).
///
/// Unknown sectors compare against the built-in fallback row.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectorComparisonScoring;

impl SectorComparisonScoring {
    pub fn compare(snapshot: &FundamentalsSnapshot, benchmarks: &SectorBenchmarks) -> SectorComparison {
        let sector = snapshot.sector().unwrap_or(DEFAULT_SECTOR);
        let row = benchmarks.row_or_fallback(sector);

        let metrics = BenchmarkMetric::ALL
            .into_iter()
            .filter_map(|metric| {
                let company_value = snapshot.get(metric.into()).filter(|v| *v != 0.0)?;
                let sector_median = row.get(metric).filter(|v| *v != 0.0)?;
                let comparison = Polarity::from(metric);
                let better_than_sector = match comparison {
                    Polarity::HigherIsBetter => company_value > sector_median,
                    Polarity::LowerIsBetter => company_value < sector_median,
                };
                Some(MetricComparison {
                    metric,
                    label: label(metric),
                    company_value,
                    sector_median,
                    comparison,
                    better_than_sector,
                })
            })
            .collect();

        let growth = [
            (GrowthKind::Revenue, snapshot.revenue_growth()),
            (GrowthKind::Earnings, snapshot.get(Metric::EarningsGrowth)),
            (GrowthKind::OperatingCashFlow, snapshot.get(Metric::OcfGrowth)),
            (GrowthKind::ReturnOnEquity, snapshot.get(Metric::RoeGrowth)),
        ]
        .into_iter()
        .filter_map(|(kind, value)| {
            value.map(|value| GrowthReading {
                kind,
                label: kind.label(),
                value,
                interpretation: growth_interpretation(kind, value),
            })
        })
        .collect();

        let mut financial_health = Vec::new();
        if let Some(value) = snapshot.get(Metric::DebtToEquity) {
            financial_health.push(HealthReading {
                metric: Metric::DebtToEquity,
                label: "Debt-to-Equity Ratio",
                value,
                interpretation: debt_interpretation(value),
            });
        }
        if let Some(value) = snapshot.get(Metric::CurrentRatio) {
            financial_health.push(HealthReading {
                metric: Metric::CurrentRatio,
                label: "Current Ratio",
                value,
                interpretation: liquidity_interpretation(value),
            });
        }

        let mut comparison = SectorComparison {
            sector_name: sector.to_string(),
            metrics,
            growth,
            financial_health,
            verdict: FundamentalVerdict::Weak,
        };
        comparison.verdict = FundamentalVerdict::classify(
            comparison.sector_positives(),
            comparison.metrics.len(),
            comparison.growth_positives(),
            comparison.growth.len(),
        );
        debug!(
            sector,
            verdict = ?comparison.verdict,
            favourable = comparison.sector_positives(),
            compared = comparison.metrics.len(),
            "Sector comparison complete"
        );
        comparison
    }
}

impl ScoringStrategy for SectorComparisonScoring {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SectorComparison
    }

    fn score_fundamentals(&self, snapshot: &FundamentalsSnapshot, benchmarks: &SectorBenchmarks) -> ScoreResult {
        let comparison = (!snapshot.is_empty()).then(|| Self::compare(snapshot, benchmarks));
        let verdict = comparison
            .as_ref()
            .map_or(FundamentalVerdict::Weak, |c| c.verdict);
        let ranking = match verdict {
            FundamentalVerdict::Strong => Ranking::Good,
            FundamentalVerdict::Decent => Ranking::Average,
            FundamentalVerdict::Weak => Ranking::Poor,
        };

        ScoreResult {
            strategy: self.kind(),
            category_scores: BTreeMap::new(),
            metric_scores: BTreeMap::new(),
            total_score: 0.0,
            ranking,
            recommendation: fuse_simple(verdict, TechnicalCall::Hold),
            comparison,
        }
    }

    fn fuse_recommendation(&self, score: &ScoreResult, technical: TechnicalCall) -> Recommendation {
        let verdict = score
            .comparison
            .as_ref()
            .map_or(FundamentalVerdict::Weak, |c| c.verdict);
        fuse_simple(verdict, technical)
    }
}
