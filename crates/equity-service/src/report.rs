//! Serialisable results returned by the analysis service

use crate::cache::Freshness;
use crate::store::FileStatus;
use equity_engine::benchmarks::REPRESENTATIVE_STOCKS;
use equity_engine::{FundamentalsSnapshot, Metric, Recommendation, ScoreResult, SectorBenchmarks, TechnicalCall};
use serde::Serialize;
use std::collections::BTreeMap;

const MISSING: &str = "N/A";

/// Analysis of one symbol
#[derive(Debug, Clone, Serialize)]
pub struct StockReport {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub fundamental_metrics: BTreeMap<String, String>,
    pub fundamental_analysis: ScoreResult,
    pub technical_recommendation: TechnicalCall,
    pub overall_recommendation: Recommendation,
    /// `%Y-%m-%d %H:%M:%S` UTC of the underlying fetch
    pub last_updated: String,
    pub freshness: Freshness,
}

/// Display string for one metric value
///
/// Dollar amounts get thousands separators, fractions become percentages
/// with one decimal, ratios keep two decimals. Anything else is printed as is.
pub fn format_metric(metric: Metric, value: f64) -> String {
    if metric.is_currency() {
        format!("${}", group_thousands(value))
    } else if metric.is_percentage() {
        format!("{:.1}%", value * 100.0)
    } else if metric.is_ratio() {
        format!("{value:.2}")
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, digit) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if value < 0.0 && rounded != "0" {
        grouped.insert(0, '-');
    }
    grouped
}

/// Every known metric keyed by name, `N/A` where the snapshot has no value
pub fn formatted_metrics(snapshot: &FundamentalsSnapshot) -> BTreeMap<String, String> {
    let mut formatted: BTreeMap<String, String> = Metric::ALL
        .into_iter()
        .map(|metric| {
            let text = snapshot
                .get(metric)
                .map_or_else(|| MISSING.to_string(), |value| format_metric(metric, value));
            (metric.key().to_string(), text)
        })
        .collect();

    let descriptive = [
        ("sector", snapshot.sector()),
        ("industry", snapshot.industry()),
        ("country", snapshot.country()),
    ];
    for (key, value) in descriptive {
        formatted.insert(key.to_string(), value.unwrap_or(MISSING).to_string());
    }
    formatted
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkData {
    pub total_sectors: usize,
    pub sectors_available: Vec<String>,
    pub last_calculated: String,
    pub calculation_method: String,
    pub using_fallback: bool,
}

impl From<&SectorBenchmarks> for BenchmarkData {
    fn from(table: &SectorBenchmarks) -> Self {
        let metadata = table.metadata.as_ref();
        Self {
            total_sectors: table.len(),
            sectors_available: table.sector_names().map(str::to_string).collect(),
            last_calculated: metadata.map_or_else(|| "Unknown".to_string(), |m| m.last_updated.clone()),
            calculation_method: metadata.map_or_else(|| "Unknown".to_string(), |m| m.calculation_method.clone()),
            using_fallback: table.is_fallback(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepresentativeStocks {
    pub total_stocks: usize,
    pub stocks_per_sector: BTreeMap<String, usize>,
}

impl RepresentativeStocks {
    pub fn current() -> Self {
        let stocks_per_sector: BTreeMap<String, usize> = REPRESENTATIVE_STOCKS
            .iter()
            .map(|(sector, stocks)| ((*sector).to_string(), stocks.len()))
            .collect();
        Self {
            total_stocks: stocks_per_sector.values().sum(),
            stocks_per_sector,
        }
    }
}

/// State of the benchmark file and the table in use
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkStatus {
    pub file_status: FileStatus,
    pub benchmark_data: BenchmarkData,
    pub representative_stocks: RepresentativeStocks,
}

/// Outcome of a benchmark recomputation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub sectors_calculated: Vec<String>,
    pub total_sectors: usize,
    pub last_updated: String,
    pub file_saved: String,
}
