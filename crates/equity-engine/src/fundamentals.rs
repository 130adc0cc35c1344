//! Point-in-time fundamentals for one company
//!
//! A snapshot maps metric names to numbers. Missing or non-finite values are
//! simply absent, never stored as zero. On the wire the snapshot is a flat
//! JSON object keyed by metric name, plus `sector`, `industry`,
//! `company_name` and `country` strings; unknown keys and `null` values are
//! ignored when reading.

use crate::benchmarks::BenchmarkMetric;
use crate::growth::GrowthMetrics;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Numeric fundamentals a provider may report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    MarketCap,
    EnterpriseValue,
    SharesOutstanding,
    PeRatio,
    ForwardPe,
    PegRatio,
    PriceToBook,
    PriceToSales,
    EvToRevenue,
    EvToEbitda,
    ProfitMargin,
    OperatingMargin,
    ReturnOnAssets,
    ReturnOnEquity,
    TotalDebt,
    TotalCash,
    DebtToEquity,
    CurrentRatio,
    QuickRatio,
    RevenueGrowth,
    RevenueGrowthYoy,
    EarningsGrowth,
    OcfGrowth,
    RoeGrowth,
    DividendYield,
    PayoutRatio,
    Beta,
    FiftyTwoWeekHigh,
    FiftyTwoWeekLow,
    AverageVolume,
    Employees,
    CurrentPrice,
    PreviousClose,
}

impl Metric {
    pub const ALL: [Metric; 33] = [
        Self::MarketCap,
        Self::EnterpriseValue,
        Self::SharesOutstanding,
        Self::PeRatio,
        Self::ForwardPe,
        Self::PegRatio,
        Self::PriceToBook,
        Self::PriceToSales,
        Self::EvToRevenue,
        Self::EvToEbitda,
        Self::ProfitMargin,
        Self::OperatingMargin,
        Self::ReturnOnAssets,
        Self::ReturnOnEquity,
        Self::TotalDebt,
        Self::TotalCash,
        Self::DebtToEquity,
        Self::CurrentRatio,
        Self::QuickRatio,
        Self::RevenueGrowth,
        Self::RevenueGrowthYoy,
        Self::EarningsGrowth,
        Self::OcfGrowth,
        Self::RoeGrowth,
        Self::DividendYield,
        Self::PayoutRatio,
        Self::Beta,
        Self::FiftyTwoWeekHigh,
        Self::FiftyTwoWeekLow,
        Self::AverageVolume,
        Self::Employees,
        Self::CurrentPrice,
        Self::PreviousClose,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::MarketCap => "market_cap",
            Self::EnterpriseValue => "enterprise_value",
            Self::SharesOutstanding => "shares_outstanding",
            Self::PeRatio => "pe_ratio",
            Self::ForwardPe => "forward_pe",
            Self::PegRatio => "peg_ratio",
            Self::PriceToBook => "price_to_book",
            Self::PriceToSales => "price_to_sales",
            Self::EvToRevenue => "ev_to_revenue",
            Self::EvToEbitda => "ev_to_ebitda",
            Self::ProfitMargin => "profit_margin",
            Self::OperatingMargin => "operating_margin",
            Self::ReturnOnAssets => "return_on_assets",
            Self::ReturnOnEquity => "return_on_equity",
            Self::TotalDebt => "total_debt",
            Self::TotalCash => "total_cash",
            Self::DebtToEquity => "debt_to_equity",
            Self::CurrentRatio => "current_ratio",
            Self::QuickRatio => "quick_ratio",
            Self::RevenueGrowth => "revenue_growth",
            Self::RevenueGrowthYoy => "revenue_growth_yoy",
            Self::EarningsGrowth => "earnings_growth",
            Self::OcfGrowth => "ocf_growth",
            Self::RoeGrowth => "roe_growth",
            Self::DividendYield => "dividend_yield",
            Self::PayoutRatio => "payout_ratio",
            Self::Beta => "beta",
            Self::FiftyTwoWeekHigh => "52_week_high",
            Self::FiftyTwoWeekLow => "52_week_low",
            Self::AverageVolume => "avg_volume",
            Self::Employees => "employees",
            Self::CurrentPrice => "current_price",
            Self::PreviousClose => "previous_close",
        }
    }

    /// Parse a metric name; the `_yoy` spellings of the derived growth figures are accepted
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ocf_growth_yoy" => Some(Self::OcfGrowth),
            "roe_growth_yoy" => Some(Self::RoeGrowth),
            _ => Self::ALL.into_iter().find(|m| m.key() == key),
        }
    }

    /// Values expressed as fractions and displayed as percentages
    pub fn is_percentage(&self) -> bool {
        matches!(
            self,
            Self::ProfitMargin
                | Self::OperatingMargin
                | Self::ReturnOnAssets
                | Self::ReturnOnEquity
                | Self::RevenueGrowth
                | Self::RevenueGrowthYoy
                | Self::EarningsGrowth
                | Self::OcfGrowth
                | Self::RoeGrowth
                | Self::DividendYield
        )
    }

    /// Dollar amounts
    pub fn is_currency(&self) -> bool {
        matches!(
            self,
            Self::MarketCap | Self::EnterpriseValue | Self::TotalDebt | Self::TotalCash
        )
    }

    /// Ratios displayed with two decimals
    pub fn is_ratio(&self) -> bool {
        matches!(
            self,
            Self::PeRatio
                | Self::ForwardPe
                | Self::PriceToBook
                | Self::PriceToSales
                | Self::DebtToEquity
                | Self::CurrentRatio
                | Self::Beta
        )
    }
}

impl From<BenchmarkMetric> for Metric {
    fn from(metric: BenchmarkMetric) -> Self {
        match metric {
            BenchmarkMetric::PeRatio => Self::PeRatio,
            BenchmarkMetric::PriceToBook => Self::PriceToBook,
            BenchmarkMetric::PriceToSales => Self::PriceToSales,
            BenchmarkMetric::ReturnOnEquity => Self::ReturnOnEquity,
            BenchmarkMetric::ProfitMargin => Self::ProfitMargin,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for Metric {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Self::from_key(&key)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown metric: {key}")))
    }
}

/// Fundamentals for one company at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SnapshotRepr", into = "SnapshotRepr")]
pub struct FundamentalsSnapshot {
    values: BTreeMap<Metric, f64>,
    sector: Option<String>,
    industry: Option<String>,
    company_name: Option<String>,
    country: Option<String>,
}

impl FundamentalsSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.set_sector(Some(sector.into()));
        self
    }

    pub fn with(mut self, metric: Metric, value: f64) -> Self {
        self.set(metric, Some(value));
        self
    }

    /// Store a value; `None` or a non-finite number clears the metric
    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        match value.filter(|v| v.is_finite()) {
            Some(v) => {
                self.values.insert(metric, v);
            }
            None => {
                self.values.remove(&metric);
            }
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.values.iter().map(|(m, v)| (*m, *v))
    }

    pub fn sector(&self) -> Option<&str> {
        self.sector.as_deref()
    }

    pub fn set_sector(&mut self, sector: Option<String>) {
        self.sector = sector.filter(|s| !s.trim().is_empty());
    }

    pub fn industry(&self) -> Option<&str> {
        self.industry.as_deref()
    }

    pub fn set_industry(&mut self, industry: Option<String>) {
        self.industry = industry.filter(|s| !s.trim().is_empty());
    }

    pub fn company_name(&self) -> Option<&str> {
        self.company_name.as_deref()
    }

    pub fn set_company_name(&mut self, name: Option<String>) {
        self.company_name = name.filter(|s| !s.trim().is_empty());
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn set_country(&mut self, country: Option<String>) {
        self.country = country.filter(|s| !s.trim().is_empty());
    }

    /// No metrics and no descriptive fields
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
            && self.sector.is_none()
            && self.industry.is_none()
            && self.company_name.is_none()
            && self.country.is_none()
    }

    /// Revenue growth, preferring the quarterly year-over-year figure
    ///
    /// A zero YoY figure defers to the provider's trailing figure.
    pub fn revenue_growth(&self) -> Option<f64> {
        self.get(Metric::RevenueGrowthYoy)
            .filter(|g| *g != 0.0)
            .or_else(|| self.get(Metric::RevenueGrowth))
    }

    /// Merge derived growth figures; absent figures leave existing values alone
    pub fn merge_growth(&mut self, growth: &GrowthMetrics) {
        let derived = [
            (Metric::RevenueGrowthYoy, growth.revenue_growth_yoy),
            (Metric::OcfGrowth, growth.ocf_growth),
            (Metric::RoeGrowth, growth.roe_growth),
        ];
        for (metric, value) in derived {
            if value.is_some() {
                self.set(metric, value);
            }
        }
    }
}

impl FromIterator<(Metric, f64)> for FundamentalsSnapshot {
    fn from_iter<I: IntoIterator<Item = (Metric, f64)>>(iter: I) -> Self {
        let mut snapshot = Self::default();
        for (metric, value) in iter {
            snapshot.set(metric, Some(value));
        }
        snapshot
    }
}

/// Flat JSON form of a snapshot
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
struct SnapshotRepr(BTreeMap<String, Value>);

const SECTOR: &str = "sector";
const INDUSTRY: &str = "industry";
const COMPANY_NAME: &str = "company_name";
const COUNTRY: &str = "country";

impl From<SnapshotRepr> for FundamentalsSnapshot {
    fn from(repr: SnapshotRepr) -> Self {
        let mut snapshot = Self::default();
        for (key, value) in repr.0 {
            let text = || value.as_str().map(str::to_string);
            match key.as_str() {
                SECTOR => snapshot.set_sector(text()),
                INDUSTRY => snapshot.set_industry(text()),
                COMPANY_NAME => snapshot.set_company_name(text()),
                COUNTRY => snapshot.set_country(text()),
                other => {
                    if let Some(metric) = Metric::from_key(other) {
                        snapshot.set(metric, value.as_f64());
                    }
                }
            }
        }
        snapshot
    }
}

impl From<FundamentalsSnapshot> for SnapshotRepr {
    fn from(snapshot: FundamentalsSnapshot) -> Self {
        let mut map: BTreeMap<String, Value> = snapshot
            .values
            .iter()
            .map(|(metric, value)| (metric.key().to_string(), Value::from(*value)))
            .collect();
        let text_fields = [
            (SECTOR, snapshot.sector),
            (INDUSTRY, snapshot.industry),
            (COMPANY_NAME, snapshot.company_name),
            (COUNTRY, snapshot.country),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value {
                map.insert(key.to_string(), Value::String(value));
            }
        }
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metric_keys_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_key(metric.key()), Some(metric));
        }
        assert_eq!(Metric::from_key("ocf_growth_yoy"), Some(Metric::OcfGrowth));
        assert_eq!(Metric::from_key("unknown"), None);
    }

    #[test]
    fn test_non_finite_values_are_absent() {
        let mut snapshot = FundamentalsSnapshot::new();
        snapshot.set(Metric::PeRatio, Some(f64::NAN));
        snapshot.set(Metric::PriceToBook, Some(2.0));
        assert_eq!(snapshot.get(Metric::PeRatio), None);
        assert_eq!(snapshot.get(Metric::PriceToBook), Some(2.0));

        snapshot.set(Metric::PriceToBook, None);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_deserialize_is_lenient() {
        let snapshot: FundamentalsSnapshot = serde_json::from_value(json!({
            "pe_ratio": 21.5,
            "price_to_book": null,
            "roe_growth_yoy": 0.04,
            "sector": "Technology",
            "industry": "",
            "employees": 1200,
            "mystery": "value"
        }))
        .unwrap();

        assert_eq!(snapshot.get(Metric::PeRatio), Some(21.5));
        assert_eq!(snapshot.get(Metric::PriceToBook), None);
        assert_eq!(snapshot.get(Metric::RoeGrowth), Some(0.04));
        assert_eq!(snapshot.get(Metric::Employees), Some(1200.0));
        assert_eq!(snapshot.sector(), Some("Technology"));
        assert_eq!(snapshot.industry(), None);
    }

    #[test]
    fn test_serialize_flat() {
        let snapshot = FundamentalsSnapshot::new()
            .with_sector("Utilities")
            .with(Metric::CurrentRatio, 1.4);
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value, json!({"current_ratio": 1.4, "sector": "Utilities"}));
    }

    #[test]
    fn test_revenue_growth_prefers_yoy() {
        let snapshot = FundamentalsSnapshot::new()
            .with(Metric::RevenueGrowth, 0.08)
            .with(Metric::RevenueGrowthYoy, 0.12);
        assert_eq!(snapshot.revenue_growth(), Some(0.12));

        let zero_yoy = snapshot.clone().with(Metric::RevenueGrowthYoy, 0.0);
        assert_eq!(zero_yoy.revenue_growth(), Some(0.08));
    }

    #[test]
    fn test_merge_growth_keeps_existing_values() {
        let mut snapshot = FundamentalsSnapshot::new().with(Metric::RoeGrowth, 0.02);
        snapshot.merge_growth(&GrowthMetrics {
            revenue_growth_yoy: Some(0.1),
            ocf_growth: None,
            roe_growth: None,
        });
        assert_eq!(snapshot.get(Metric::RevenueGrowthYoy), Some(0.1));
        assert_eq!(snapshot.get(Metric::RoeGrowth), Some(0.02));
        assert_eq!(snapshot.get(Metric::OcfGrowth), None);
    }
}
