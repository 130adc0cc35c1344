//! Recommendation and ranking labels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Five-way overall or fundamental call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "STRONG BUY")]
    StrongBuy,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "STRONG SELL")]
    StrongSell,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG BUY",
            Self::Buy => "BUY",
            Self::Hold => "HOLD",
            Self::Sell => "SELL",
            Self::StrongSell => "STRONG SELL",
        }
    }

    pub fn is_bullish(&self) -> bool {
        matches!(self, Self::StrongBuy | Self::Buy)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, Self::Sell | Self::StrongSell)
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ranking label derived from a 0-10 total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ranking {
    Excellent,
    Good,
    Average,
    BelowAverage,
    Poor,
}

impl Ranking {
    /// >= 8 excellent, >= 6 good, >= 4 average, >= 2 below average, else poor
    pub fn from_total(total: f64) -> Self {
        if total >= 8.0 {
            Self::Excellent
        } else if total >= 6.0 {
            Self::Good
        } else if total >= 4.0 {
            Self::Average
        } else if total >= 2.0 {
            Self::BelowAverage
        } else {
            Self::Poor
        }
    }

    pub fn recommendation(&self) -> Recommendation {
        match self {
            Self::Excellent => Recommendation::StrongBuy,
            Self::Good => Recommendation::Buy,
            Self::Average => Recommendation::Hold,
            Self::BelowAverage => Recommendation::Sell,
            Self::Poor => Recommendation::StrongSell,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Average => "AVERAGE",
            Self::BelowAverage => "BELOW_AVERAGE",
            Self::Poor => "POOR",
        }
    }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-way call from the recent signal tally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TechnicalCall {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl TechnicalCall {
    pub fn is_bullish(&self) -> bool {
        matches!(self, Self::Buy)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, Self::Sell)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl fmt::Display for TechnicalCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_thresholds() {
        assert_eq!(Ranking::from_total(10.0), Ranking::Excellent);
        assert_eq!(Ranking::from_total(8.0), Ranking::Excellent);
        assert_eq!(Ranking::from_total(7.99), Ranking::Good);
        assert_eq!(Ranking::from_total(6.0), Ranking::Good);
        assert_eq!(Ranking::from_total(4.0), Ranking::Average);
        assert_eq!(Ranking::from_total(2.0), Ranking::BelowAverage);
        assert_eq!(Ranking::from_total(1.99), Ranking::Poor);
        assert_eq!(Ranking::from_total(0.0), Ranking::Poor);
    }

    #[test]
    fn test_ranking_maps_to_recommendation() {
        assert_eq!(Ranking::Excellent.recommendation(), Recommendation::StrongBuy);
        assert_eq!(Ranking::BelowAverage.recommendation(), Recommendation::Sell);
        assert_eq!(Ranking::Poor.recommendation(), Recommendation::StrongSell);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&Recommendation::StrongBuy).unwrap(),
            "\"STRONG BUY\""
        );
        assert_eq!(
            serde_json::to_string(&Ranking::BelowAverage).unwrap(),
            "\"BELOW_AVERAGE\""
        );
        assert_eq!(serde_json::to_string(&TechnicalCall::Hold).unwrap(), "\"HOLD\"");
        assert_eq!(Recommendation::StrongSell.to_string(), "STRONG SELL");
    }
}
