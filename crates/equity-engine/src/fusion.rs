//! Fusion of the fundamental view with the technical call

use crate::recommendation::{Recommendation, TechnicalCall};
use serde::{Deserialize, Serialize};

/// Coarse fundamental verdict used by sector-comparison fusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundamentalVerdict {
    /// Most sector comparisons favourable and at least half the growth metrics strong
    Strong,
    /// Some favourable comparison, or at least two strong growth metrics
    Decent,
    Weak,
}

impl FundamentalVerdict {
    /// Classify from favourable/total counts
    pub fn classify(
        sector_positives: usize,
        sector_total: usize,
        growth_positives: usize,
        growth_total: usize,
    ) -> Self {
        let sector_majority =
            sector_total > 0 && sector_positives as f64 >= sector_total as f64 * 0.6;
        let growth_half = growth_total > 0 && growth_positives as f64 >= growth_total as f64 * 0.5;

        if sector_majority && growth_half {
            Self::Strong
        } else if sector_positives > 0 || growth_positives >= 2 {
            Self::Decent
        } else {
            Self::Weak
        }
    }
}

/// Verdict-driven fusion
///
/// | verdict | BUY        | HOLD | SELL |
/// |---------|------------|------|------|
/// | strong  | STRONG BUY | BUY  | BUY  |
/// | decent  | BUY        | HOLD | HOLD |
/// | weak    | HOLD       | HOLD | SELL |
pub fn fuse_simple(verdict: FundamentalVerdict, technical: TechnicalCall) -> Recommendation {
    match (verdict, technical) {
        (FundamentalVerdict::Strong, TechnicalCall::Buy) => Recommendation::StrongBuy,
        (FundamentalVerdict::Strong, _) => Recommendation::Buy,
        (FundamentalVerdict::Decent, TechnicalCall::Buy) => Recommendation::Buy,
        (FundamentalVerdict::Decent, _) => Recommendation::Hold,
        (FundamentalVerdict::Weak, TechnicalCall::Sell) => Recommendation::Sell,
        (FundamentalVerdict::Weak, _) => Recommendation::Hold,
    }
}

/// Compatibility-table fusion of a five-way fundamental call with the technical call
///
/// Rules apply in order: both bullish, either bullish, both bearish, either
/// bearish, otherwise hold. A bullish side paired with a bearish side
/// therefore lands on BUY.
pub fn fuse_score_based(fundamental: Recommendation, technical: TechnicalCall) -> Recommendation {
    let fundamental_bullish = fundamental.is_bullish();
    let technical_bullish = technical.is_bullish();
    let fundamental_bearish = fundamental.is_bearish();
    let technical_bearish = technical.is_bearish();

    if fundamental_bullish && technical_bullish {
        Recommendation::StrongBuy
    } else if fundamental_bullish || technical_bullish {
        Recommendation::Buy
    } else if fundamental_bearish && technical_bearish {
        Recommendation::StrongSell
    } else if fundamental_bearish || technical_bearish {
        Recommendation::Sell
    } else {
        Recommendation::Hold
    }
}
