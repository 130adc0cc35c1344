use super::tiers::{GrowthKind, current_ratio_tier, debt_to_equity_tier, score_metric};
use super::{Category, ScoreResult, ScoringStrategy, StrategyKind, mean};
use crate::benchmarks::{BenchmarkMetric, SectorBenchmarks};
use crate::fundamentals::{FundamentalsSnapshot, Metric};
use crate::fusion::fuse_score_based;
use crate::recommendation::{Ranking, Recommendation, TechnicalCall};
use std::collections::BTreeMap;

const VALUATION: [BenchmarkMetric; 3] = [
    BenchmarkMetric::PeRatio,
    BenchmarkMetric::PriceToBook,
    BenchmarkMetric::PriceToSales,
];

const PROFITABILITY: [BenchmarkMetric; 2] = [BenchmarkMetric::ReturnOnEquity, BenchmarkMetric::ProfitMargin];

/// Category scoring on a 0-10 scale
///
/// - Valuation and profitability: mean of the available sector-relative
///   sub-scores (absolute thresholds when the sector has no median). A
///   reported but non-positive value scores 0 and still counts.
/// - Growth: weighted blend of the available growth tiers, renormalised over
///   the weights actually present.
/// - Financial health: mean of the debt-to-equity and current-ratio tiers.
///
/// The total is the mean over all four categories, with empty categories
/// counted as 0, so sparse snapshots rank lower than their sub-scores alone
/// would suggest.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScoring;

impl WeightedScoring {
    fn ratio_category(
        metrics: &[BenchmarkMetric],
        snapshot: &FundamentalsSnapshot,
        benchmarks: &SectorBenchmarks,
        metric_scores: &mut BTreeMap<Metric, u8>,
    ) -> Option<f64> {
        let mut scores = Vec::new();
        for benchmark in metrics {
            let metric = Metric::from(*benchmark);
            if let Some(value) = snapshot.get(metric) {
                let score = score_metric(Some(value), *benchmark, snapshot.sector(), benchmarks);
                metric_scores.insert(metric, score);
                scores.push(f64::from(score));
            }
        }
        mean(&scores)
    }

    fn growth_category(snapshot: &FundamentalsSnapshot, metric_scores: &mut BTreeMap<Metric, u8>) -> Option<f64> {
        let readings = [
            (GrowthKind::Revenue, Metric::RevenueGrowth, snapshot.revenue_growth()),
            (GrowthKind::Earnings, Metric::EarningsGrowth, snapshot.get(Metric::EarningsGrowth)),
            (GrowthKind::OperatingCashFlow, Metric::OcfGrowth, snapshot.get(Metric::OcfGrowth)),
            (GrowthKind::ReturnOnEquity, Metric::RoeGrowth, snapshot.get(Metric::RoeGrowth)),
        ];

        let mut weighted = 0.0;
        let mut weights = 0.0;
        for (kind, metric, value) in readings {
            if let Some(value) = value {
                let tier = kind.tier(value);
                metric_scores.insert(metric, tier);
                weighted += f64::from(tier) * kind.weight();
                weights += kind.weight();
            }
        }
        (weights > 0.0).then(|| weighted / weights)
    }

    fn health_category(snapshot: &FundamentalsSnapshot, metric_scores: &mut BTreeMap<Metric, u8>) -> Option<f64> {
        let mut scores = Vec::new();
        if let Some(ratio) = snapshot.get(Metric::DebtToEquity) {
            let tier = debt_to_equity_tier(ratio);
            metric_scores.insert(Metric::DebtToEquity, tier);
            scores.push(f64::from(tier));
        }
        if let Some(ratio) = snapshot.get(Metric::CurrentRatio) {
            let tier = current_ratio_tier(ratio);
            metric_scores.insert(Metric::CurrentRatio, tier);
            scores.push(f64::from(tier));
        }
        mean(&scores)
    }
}

impl ScoringStrategy for WeightedScoring {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Weighted
    }

    fn score_fundamentals(&self, snapshot: &FundamentalsSnapshot, benchmarks: &SectorBenchmarks) -> ScoreResult {
        let mut metric_scores = BTreeMap::new();
        let categories = [
            (
                Category::Valuation,
                Self::ratio_category(&VALUATION, snapshot, benchmarks, &mut metric_scores),
            ),
            (
                Category::Profitability,
                Self::ratio_category(&PROFITABILITY, snapshot, benchmarks, &mut metric_scores),
            ),
            (Category::Growth, Self::growth_category(snapshot, &mut metric_scores)),
            (
                Category::FinancialHealth,
                Self::health_category(snapshot, &mut metric_scores),
            ),
        ];

        let category_scores: BTreeMap<Category, f64> = categories
            .into_iter()
            .map(|(category, score)| (category, score.unwrap_or(0.0)))
            .collect();
        let total_score = category_scores.values().sum::<f64>() / Category::ALL.len() as f64;
        let ranking = Ranking::from_total(total_score);

        ScoreResult {
            strategy: self.kind(),
            category_scores,
            metric_scores,
            total_score,
            ranking,
            recommendation: ranking.recommendation(),
            comparison: None,
        }
    }

    fn fuse_recommendation(&self, score: &ScoreResult, technical: TechnicalCall) -> Recommendation {
        fuse_score_based(score.recommendation, technical)
    }
}
