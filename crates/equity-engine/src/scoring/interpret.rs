//! Narrative bands for growth, leverage and liquidity

use super::tiers::GrowthKind;

pub fn growth_interpretation(kind: GrowthKind, growth: f64) -> &'static str {
    match kind {
        GrowthKind::Revenue | GrowthKind::Earnings => {
            if growth >= 0.20 {
                "Excellent - Strong growth"
            } else if growth >= 0.10 {
                "Good - Solid growth"
            } else if growth >= 0.05 {
                "Moderate - Steady growth"
            } else if growth >= 0.0 {
                "Slow - Minimal growth"
            } else {
                "Declining - Negative growth"
            }
        }
        GrowthKind::OperatingCashFlow => {
            if growth >= 0.15 {
                "Excellent - Strong cash generation"
            } else if growth >= 0.05 {
                "Good - Healthy cash flow"
            } else if growth >= 0.0 {
                "Stable - Positive cash flow"
            } else if growth >= -0.05 {
                "Concerning - Slight decline"
            } else {
                "Weak - Declining cash flow"
            }
        }
        GrowthKind::ReturnOnEquity => {
            if growth >= 0.10 {
                "Excellent - Improving efficiency"
            } else if growth >= 0.05 {
                "Good - Better returns"
            } else if growth >= 0.0 {
                "Stable - Maintaining efficiency"
            } else if growth >= -0.05 {
                "Watch - Slight decline"
            } else {
                "Concerning - Declining efficiency"
            }
        }
    }
}

pub fn debt_interpretation(debt_to_equity: f64) -> &'static str {
    if (0.3..=1.2).contains(&debt_to_equity) {
        "Optimal - Balanced capital structure"
    } else if (0.1..0.3).contains(&debt_to_equity) {
        "Conservative - Low debt usage"
    } else if debt_to_equity > 1.2 && debt_to_equity <= 1.8 {
        "Aggressive - Higher leverage"
    } else if debt_to_equity < 0.1 {
        "Very Conservative - Minimal debt"
    } else if debt_to_equity > 1.8 && debt_to_equity <= 2.5 {
        "High Leverage - Monitor closely"
    } else {
        "Very High - Potential concern"
    }
}

pub fn liquidity_interpretation(current_ratio: f64) -> &'static str {
    if (1.5..=3.0).contains(&current_ratio) {
        "Good - Healthy liquidity"
    } else if (1.2..1.5).contains(&current_ratio) {
        "Adequate - Sufficient liquidity"
    } else if current_ratio > 3.0 && current_ratio <= 4.0 {
        "High - Excess cash (could be more efficient)"
    } else if (1.0..1.2).contains(&current_ratio) {
        "Tight - Monitor cash flow"
    } else if current_ratio > 4.0 {
        "Very High - Inefficient cash usage"
    } else {
        "Concerning - Liquidity issues"
    }
}
