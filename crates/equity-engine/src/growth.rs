//! Growth figures derived from quarterly statements
//!
//! All quarterly inputs are ordered most recent first. `None` marks a quarter
//! the provider did not report.

use serde::{Deserialize, Serialize};

/// Quarterly statement lines needed for growth derivation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyFinancials {
    pub total_revenue: Vec<Option<f64>>,
    pub operating_cash_flow: Vec<Option<f64>>,
    pub net_income: Vec<Option<f64>>,
    pub stockholders_equity: Vec<Option<f64>>,
}

/// Growth rates as fractions (0.12 = 12%)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthMetrics {
    pub revenue_growth_yoy: Option<f64>,
    pub ocf_growth: Option<f64>,
    pub roe_growth: Option<f64>,
}

impl QuarterlyFinancials {
    pub fn growth_metrics(&self) -> GrowthMetrics {
        GrowthMetrics {
            revenue_growth_yoy: year_over_year(&self.total_revenue),
            ocf_growth: year_over_year(&self.operating_cash_flow),
            roe_growth: roe_growth(&self.net_income, &self.stockholders_equity),
        }
    }
}

/// Latest quarter against the same quarter a year earlier
///
/// Needs four quarters and a non-zero year-ago value. Growth is measured
/// against the magnitude of the year-ago figure, so a loss shrinking toward
/// zero reads as positive growth.
pub fn year_over_year(quarters: &[Option<f64>]) -> Option<f64> {
    if quarters.len() < 4 {
        return None;
    }
    let current = finite(quarters[0])?;
    let year_ago = finite(quarters[3])?;
    if year_ago == 0.0 {
        return None;
    }
    Some((current - year_ago) / year_ago.abs())
}

/// Growth of trailing-twelve-month return on equity
///
/// Current TTM income is the sum of the latest four quarters over the latest
/// equity. The year-ago TTM sums quarters 3..7 when seven quarters exist,
/// otherwise it annualises quarter 3; it is divided by equity from quarter 3.
/// Both equity figures must be positive.
pub fn roe_growth(net_income: &[Option<f64>], equity: &[Option<f64>]) -> Option<f64> {
    if net_income.len() < 4 || equity.len() < 4 {
        return None;
    }

    let current_income = sum_reported(&net_income[0..4])?;
    let year_ago_income = if net_income.len() >= 7 {
        sum_reported(&net_income[3..7])?
    } else {
        finite(net_income[3])? * 4.0
    };

    let current_equity = finite(equity[0])?;
    let year_ago_equity = finite(equity[3])?;
    if current_equity <= 0.0 || year_ago_equity <= 0.0 {
        return None;
    }

    let current_roe = current_income / current_equity;
    let year_ago_roe = year_ago_income / year_ago_equity;
    if year_ago_roe == 0.0 {
        return None;
    }
    Some((current_roe - year_ago_roe) / year_ago_roe.abs())
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Sum of the reported quarters, skipping gaps; `None` if nothing was reported
fn sum_reported(quarters: &[Option<f64>]) -> Option<f64> {
    let reported: Vec<f64> = quarters.iter().filter_map(|q| finite(*q)).collect();
    (!reported.is_empty()).then(|| reported.iter().sum())
}
