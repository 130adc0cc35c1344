//! Tier tables that turn a single metric value into a 0-10 sub-score

use super::Polarity;
use crate::benchmarks::{BenchmarkMetric, SectorBenchmarks};
use crate::fundamentals::Metric;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Score a value by its ratio to the sector median
///
/// Higher-is-better metrics step down from 1.5x the median; lower-is-better
/// metrics mirror the table with inverse ratios.
pub fn relative_tier(value: f64, median: f64, polarity: Polarity) -> u8 {
    match polarity {
        Polarity::HigherIsBetter => {
            if value >= median * 1.5 {
                10
            } else if value >= median * 1.25 {
                9
            } else if value >= median * 1.1 {
                8
            } else if value >= median {
                7
            } else if value >= median * 0.9 {
                6
            } else if value >= median * 0.75 {
                4
            } else if value >= median * 0.5 {
                2
            } else {
                1
            }
        }
        Polarity::LowerIsBetter => {
            if value <= median * 0.67 {
                10
            } else if value <= median * 0.8 {
                9
            } else if value <= median * 0.9 {
                8
            } else if value <= median {
                7
            } else if value <= median * 1.1 {
                6
            } else if value <= median * 1.25 {
                4
            } else if value <= median * 1.5 {
                2
            } else {
                1
            }
        }
    }
}

/// Fixed breakpoints, independent of sector. Unknown metrics score a neutral 5.
pub fn score_absolute(metric: Metric, value: f64) -> u8 {
    match metric {
        Metric::PeRatio => {
            if value < 15.0 {
                10
            } else if value < 25.0 {
                7
            } else if value < 35.0 {
                4
            } else {
                1
            }
        }
        Metric::PriceToBook => {
            if value < 1.5 {
                10
            } else if value < 3.0 {
                7
            } else if value < 5.0 {
                4
            } else {
                1
            }
        }
        Metric::ReturnOnEquity | Metric::ProfitMargin => {
            if value > 0.20 {
                10
            } else if value > 0.15 {
                8
            } else if value > 0.10 {
                6
            } else if value > 0.05 {
                3
            } else {
                1
            }
        }
        _ => 5,
    }
}

/// Sector-relative score with absolute fallback
///
/// Missing or non-positive values score 0. When the sector is unknown or has
/// no usable median for the metric, the absolute table applies.
pub fn score_metric(
    value: Option<f64>,
    metric: BenchmarkMetric,
    sector: Option<&str>,
    benchmarks: &SectorBenchmarks,
) -> u8 {
    let Some(value) = value.filter(|v| *v > 0.0) else {
        return 0;
    };
    match sector.and_then(|s| benchmarks.median(s, metric)) {
        Some(median) => relative_tier(value, median, metric.into()),
        None => {
            trace!(%metric, sector, "No sector median, scoring on absolute thresholds");
            score_absolute(metric.into(), value)
        }
    }
}

/// The four growth signals and their blend weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthKind {
    Revenue,
    Earnings,
    OperatingCashFlow,
    ReturnOnEquity,
}

impl GrowthKind {
    pub const ALL: [GrowthKind; 4] = [
        Self::Revenue,
        Self::Earnings,
        Self::OperatingCashFlow,
        Self::ReturnOnEquity,
    ];

    pub fn weight(&self) -> f64 {
        match self {
            Self::Revenue => 0.30,
            Self::Earnings => 0.20,
            Self::OperatingCashFlow => 0.15,
            Self::ReturnOnEquity => 0.35,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue_growth",
            Self::Earnings => "earnings_growth",
            Self::OperatingCashFlow => "ocf_growth",
            Self::ReturnOnEquity => "roe_growth",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Revenue => "Revenue Growth",
            Self::Earnings => "Earnings Growth",
            Self::OperatingCashFlow => "Operating Cash Flow Growth",
            Self::ReturnOnEquity => "ROE Growth",
        }
    }

    /// 1 / 3-or-4 / 6 / 8 / 10 on the metric's own breakpoints
    ///
    /// The breakpoints match the narrative bands in
    /// [`super::interpret::growth_interpretation`].
    pub fn tier(&self, growth: f64) -> u8 {
        let (top, good, flat, floor, floor_score) = match self {
            Self::Revenue | Self::Earnings => (0.20, 0.10, 0.05, 0.0, 3),
            Self::OperatingCashFlow => (0.15, 0.05, 0.0, -0.05, 4),
            Self::ReturnOnEquity => (0.10, 0.05, 0.0, -0.05, 4),
        };
        if growth >= top {
            10
        } else if growth >= good {
            8
        } else if growth >= flat {
            6
        } else if growth >= floor {
            floor_score
        } else {
            1
        }
    }
}

/// Debt-to-equity (as a ratio, not a percentage); negative equity scores lowest
pub fn debt_to_equity_tier(ratio: f64) -> u8 {
    if ratio < 0.0 {
        1
    } else if ratio < 0.5 {
        10
    } else if ratio < 1.0 {
        8
    } else if ratio < 1.5 {
        6
    } else if ratio < 2.5 {
        3
    } else {
        1
    }
}

pub fn current_ratio_tier(ratio: f64) -> u8 {
    if ratio >= 2.0 {
        10
    } else if ratio >= 1.5 {
        8
    } else if ratio >= 1.2 {
        6
    } else if ratio >= 1.0 {
        3
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_tier_higher_is_better() {
        let median = 0.10;
        let tiers: Vec<u8> = [0.16, 0.13, 0.111, 0.10, 0.095, 0.08, 0.05, 0.04]
            .iter()
            .map(|v| relative_tier(*v, median, Polarity::HigherIsBetter))
            .collect();
        assert_eq!(tiers, vec![10, 9, 8, 7, 6, 4, 2, 1]);
    }

    #[test]
    fn test_relative_tier_lower_is_better() {
        let median = 20.0;
        let tiers: Vec<u8> = [13.0, 16.0, 18.0, 20.0, 22.0, 25.0, 30.0, 31.0]
            .iter()
            .map(|v| relative_tier(*v, median, Polarity::LowerIsBetter))
            .collect();
        assert_eq!(tiers, vec![10, 9, 8, 7, 6, 4, 2, 1]);
    }

    #[test]
    fn test_absolute_breakpoints() {
        assert_eq!(score_absolute(Metric::PeRatio, 14.9), 10);
        assert_eq!(score_absolute(Metric::PeRatio, 15.0), 7);
        assert_eq!(score_absolute(Metric::PeRatio, 40.0), 1);
        assert_eq!(score_absolute(Metric::PriceToBook, 2.0), 7);
        assert_eq!(score_absolute(Metric::ReturnOnEquity, 0.21), 10);
        assert_eq!(score_absolute(Metric::ReturnOnEquity, 0.20), 8);
        assert_eq!(score_absolute(Metric::ProfitMargin, 0.05), 1);
        assert_eq!(score_absolute(Metric::PriceToSales, 3.0), 5);
    }

    #[test]
    fn test_score_metric_falls_back_to_absolute() {
        let table = SectorBenchmarks::fallback();
        // Technology median P/E 25: 10 <= 16.75
        assert_eq!(score_metric(Some(10.0), BenchmarkMetric::PeRatio, Some("Technology"), &table), 10);
        // unknown sector: absolute P/E table
        assert_eq!(score_metric(Some(20.0), BenchmarkMetric::PeRatio, Some("Crypto"), &table), 7);
        assert_eq!(score_metric(Some(20.0), BenchmarkMetric::PeRatio, None, &table), 7);
    }

    #[test]
    fn test_score_metric_non_positive_is_zero() {
        let table = SectorBenchmarks::fallback();
        assert_eq!(score_metric(Some(-3.0), BenchmarkMetric::PeRatio, Some("Technology"), &table), 0);
        assert_eq!(score_metric(Some(0.0), BenchmarkMetric::ReturnOnEquity, None, &table), 0);
        assert_eq!(score_metric(None, BenchmarkMetric::ReturnOnEquity, None, &table), 0);
    }

    #[test]
    fn test_growth_tiers() {
        assert_eq!(GrowthKind::Revenue.tier(0.25), 10);
        assert_eq!(GrowthKind::Revenue.tier(0.0), 3);
        assert_eq!(GrowthKind::Revenue.tier(-0.01), 1);
        assert_eq!(GrowthKind::OperatingCashFlow.tier(-0.03), 4);
        assert_eq!(GrowthKind::ReturnOnEquity.tier(0.07), 8);
        assert_eq!(GrowthKind::ReturnOnEquity.tier(0.01), 6);
    }

    #[test]
    fn test_growth_weights_sum_to_one() {
        let total: f64 = GrowthKind::ALL.iter().map(GrowthKind::weight).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_health_tiers() {
        assert_eq!(debt_to_equity_tier(0.3), 10);
        assert_eq!(debt_to_equity_tier(1.2), 6);
        assert_eq!(debt_to_equity_tier(3.0), 1);
        assert_eq!(debt_to_equity_tier(-0.5), 1);
        assert_eq!(current_ratio_tier(2.5), 10);
        assert_eq!(current_ratio_tier(1.1), 3);
        assert_eq!(current_ratio_tier(0.8), 1);
    }
}
