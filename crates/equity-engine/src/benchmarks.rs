//! Sector median benchmarks
//!
//! The table maps a sector name to the median of five core ratios across a
//! fixed list of representative companies. It serialises to the flat JSON
//! layout used on disk:
//!
//! ```json
//! {
//!   "Technology": { "pe_ratio_median": 25.0, "_sector_info": { ... } },
//!   "_metadata": { "last_updated": "...", "calculation_method": "..." }
//! }
//! ```
//!
//! [`SectorBenchmarkStore`] holds the live table. Readers take a cheap
//! snapshot; a recompute swaps the whole table in one step.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Marker in `_metadata.last_updated` for the built-in table
pub const FALLBACK_MARKER: &str = "fallback";
pub const STATIC_FALLBACK_METHOD: &str = "static_fallback";
pub const COMPUTED_METHOD: &str = "yahoo_finance_percentiles";

/// The five ratios that carry a sector median
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkMetric {
    PeRatio,
    PriceToBook,
    PriceToSales,
    ReturnOnEquity,
    ProfitMargin,
}

impl BenchmarkMetric {
    pub const ALL: [BenchmarkMetric; 5] = [
        Self::PeRatio,
        Self::PriceToBook,
        Self::PriceToSales,
        Self::ReturnOnEquity,
        Self::ProfitMargin,
    ];

    /// Field name in fundamentals output
    pub fn key(&self) -> &'static str {
        match self {
            Self::PeRatio => "pe_ratio",
            Self::PriceToBook => "price_to_book",
            Self::PriceToSales => "price_to_sales",
            Self::ReturnOnEquity => "return_on_equity",
            Self::ProfitMargin => "profit_margin",
        }
    }

    /// Field name in the benchmark file
    pub fn median_key(&self) -> &'static str {
        match self {
            Self::PeRatio => "pe_ratio_median",
            Self::PriceToBook => "price_to_book_median",
            Self::PriceToSales => "price_to_sales_median",
            Self::ReturnOnEquity => "return_on_equity_median",
            Self::ProfitMargin => "profit_margin_median",
        }
    }

    /// Valuation multiples are better when lower
    pub fn higher_is_better(&self) -> bool {
        matches!(self, Self::ReturnOnEquity | Self::ProfitMargin)
    }
}

impl fmt::Display for BenchmarkMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Provenance for one computed sector row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorInfo {
    pub total_stocks_analyzed: usize,
    pub representative_stocks: Vec<String>,
    pub calculation_date: String,
}

/// Median values for one sector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorBenchmark {
    #[serde(rename = "pe_ratio_median", default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(rename = "price_to_book_median", default, skip_serializing_if = "Option::is_none")]
    pub price_to_book: Option<f64>,
    #[serde(rename = "price_to_sales_median", default, skip_serializing_if = "Option::is_none")]
    pub price_to_sales: Option<f64>,
    #[serde(rename = "return_on_equity_median", default, skip_serializing_if = "Option::is_none")]
    pub return_on_equity: Option<f64>,
    #[serde(rename = "profit_margin_median", default, skip_serializing_if = "Option::is_none")]
    pub profit_margin: Option<f64>,
    #[serde(rename = "_sector_info", default, skip_serializing_if = "Option::is_none")]
    pub sector_info: Option<SectorInfo>,
}

impl SectorBenchmark {
    pub fn new(pe_ratio: f64, price_to_book: f64, price_to_sales: f64, return_on_equity: f64, profit_margin: f64) -> Self {
        Self {
            pe_ratio: Some(pe_ratio),
            price_to_book: Some(price_to_book),
            price_to_sales: Some(price_to_sales),
            return_on_equity: Some(return_on_equity),
            profit_margin: Some(profit_margin),
            sector_info: None,
        }
    }

    /// Stored median, which may be absent or non-positive
    pub fn get(&self, metric: BenchmarkMetric) -> Option<f64> {
        match metric {
            BenchmarkMetric::PeRatio => self.pe_ratio,
            BenchmarkMetric::PriceToBook => self.price_to_book,
            BenchmarkMetric::PriceToSales => self.price_to_sales,
            BenchmarkMetric::ReturnOnEquity => self.return_on_equity,
            BenchmarkMetric::ProfitMargin => self.profit_margin,
        }
    }

    /// Overwrite one median; `None` clears it
    pub fn set(&mut self, metric: BenchmarkMetric, value: Option<f64>) {
        let slot = match metric {
            BenchmarkMetric::PeRatio => &mut self.pe_ratio,
            BenchmarkMetric::PriceToBook => &mut self.price_to_book,
            BenchmarkMetric::PriceToSales => &mut self.price_to_sales,
            BenchmarkMetric::ReturnOnEquity => &mut self.return_on_equity,
            BenchmarkMetric::ProfitMargin => &mut self.profit_margin,
        };
        *slot = value;
    }

    /// Built-in medians for a sector; unlisted sectors share a default row
    pub fn fallback(sector: &str) -> Self {
        match sector {
            "Technology" => Self::new(25.0, 4.0, 6.0, 0.15, 0.12),
            "Healthcare" => Self::new(18.0, 3.0, 4.0, 0.12, 0.15),
            "Financial Services" => Self::new(12.0, 1.2, 2.5, 0.10, 0.25),
            "Utilities" => Self::new(15.0, 1.5, 2.0, 0.09, 0.10),
            _ => Self::new(20.0, 3.5, 5.0, 0.12, 0.10),
        }
    }
}

/// Table-level provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkMetadata {
    pub last_updated: String,
    pub total_sectors: usize,
    pub calculation_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representative_stocks_per_sector: Option<usize>,
}

/// All sector rows plus table metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorBenchmarks {
    #[serde(rename = "_metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BenchmarkMetadata>,
    #[serde(flatten)]
    pub sectors: BTreeMap<String, SectorBenchmark>,
}

impl SectorBenchmarks {
    /// Static table used when nothing has been computed or the file is unreadable
    pub fn fallback() -> Self {
        let sectors: BTreeMap<String, SectorBenchmark> = REPRESENTATIVE_STOCKS
            .iter()
            .map(|(sector, _)| ((*sector).to_string(), SectorBenchmark::fallback(sector)))
            .collect();
        Self {
            metadata: Some(BenchmarkMetadata {
                last_updated: FALLBACK_MARKER.to_string(),
                total_sectors: sectors.len(),
                calculation_method: STATIC_FALLBACK_METHOD.to_string(),
                representative_stocks_per_sector: None,
            }),
            sectors,
        }
    }

    /// Stamp metadata for a freshly computed table
    pub fn computed(sectors: BTreeMap<String, SectorBenchmark>, last_updated: impl Into<String>) -> Self {
        Self {
            metadata: Some(BenchmarkMetadata {
                last_updated: last_updated.into(),
                total_sectors: sectors.len(),
                calculation_method: COMPUTED_METHOD.to_string(),
                representative_stocks_per_sector: Some(STOCKS_PER_SECTOR),
            }),
            sectors,
        }
    }

    /// Row for an exact sector name
    pub fn get(&self, sector: &str) -> Option<&SectorBenchmark> {
        self.sectors.get(sector)
    }

    /// The sector's row, or the built-in fallback row when the sector is unknown
    pub fn row_or_fallback(&self, sector: &str) -> SectorBenchmark {
        if let Some(row) = self.sectors.get(sector) {
            return row.clone();
        }
        debug!(sector, "Sector not in benchmarks, using fallback row");
        SectorBenchmark::fallback(sector)
    }

    /// Positive median for a sector/metric pair, if the table has one
    pub fn median(&self, sector: &str, metric: BenchmarkMetric) -> Option<f64> {
        self.sectors
            .get(sector)?
            .get(metric)
            .filter(|m| m.is_finite() && *m > 0.0)
    }

    /// Sector names in sorted order
    pub fn sector_names(&self) -> impl Iterator<Item = &str> {
        self.sectors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// True for the built-in static table
    pub fn is_fallback(&self) -> bool {
        self.metadata
            .as_ref()
            .is_some_and(|m| m.last_updated == FALLBACK_MARKER)
    }
}

/// Fundamentals of one representative company, as fetched for a benchmark run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSample {
    pub symbol: String,
    pub pe_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    pub price_to_sales: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub profit_margin: Option<f64>,
}

impl BenchmarkSample {
    pub fn get(&self, metric: BenchmarkMetric) -> Option<f64> {
        match metric {
            BenchmarkMetric::PeRatio => self.pe_ratio,
            BenchmarkMetric::PriceToBook => self.price_to_book,
            BenchmarkMetric::PriceToSales => self.price_to_sales,
            BenchmarkMetric::ReturnOnEquity => self.return_on_equity,
            BenchmarkMetric::ProfitMargin => self.profit_margin,
        }
    }

    /// A sample counts only with a positive P/E and a positive ROE
    pub fn is_valid(&self) -> bool {
        let positive = |v: Option<f64>| v.is_some_and(|v| v > 0.0);
        positive(self.pe_ratio) && positive(self.return_on_equity)
    }
}

/// Compute one sector row from its representative samples
///
/// Returns `None` when fewer than `min_valid` samples pass
/// [`BenchmarkSample::is_valid`]. A metric needs at least `min_valid` positive
/// values to get a median; otherwise it is left empty.
pub fn compute_sector_benchmark(
    samples: &[BenchmarkSample],
    min_valid: usize,
    calculation_date: &str,
) -> Option<SectorBenchmark> {
    let valid: Vec<&BenchmarkSample> = samples.iter().filter(|s| s.is_valid()).collect();
    if valid.len() < min_valid {
        debug!(valid = valid.len(), required = min_valid, "Insufficient valid samples");
        return None;
    }

    let mut row = SectorBenchmark::default();
    for metric in BenchmarkMetric::ALL {
        let mut values: Vec<f64> = valid
            .iter()
            .filter_map(|s| s.get(metric))
            .filter(|v| v.is_finite() && *v > 0.0)
            .collect();
        if values.len() >= min_valid.max(1) {
            values.sort_by(f64::total_cmp);
            row.set(metric, Some(round3(lower_median(&values))));
        }
    }

    row.sector_info = Some(SectorInfo {
        total_stocks_analyzed: valid.len(),
        representative_stocks: valid.iter().map(|s| s.symbol.clone()).collect(),
        calculation_date: calculation_date.to_string(),
    });
    Some(row)
}

/// Element at `floor(n / 2) - 1` of a sorted, non-empty slice
fn lower_median(sorted: &[f64]) -> f64 {
    let idx = (sorted.len() / 2).saturating_sub(1);
    sorted[idx]
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Companies sampled per sector
pub const STOCKS_PER_SECTOR: usize = 10;

/// Representative tickers per sector used for benchmark runs
pub const REPRESENTATIVE_STOCKS: [(&str, [&str; STOCKS_PER_SECTOR]); 11] = [
    ("Technology", ["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "NFLX", "ADBE", "CRM"]),
    ("Healthcare", ["JNJ", "UNH", "PFE", "ABBV", "TMO", "ABT", "MRK", "DHR", "BMY", "LLY"]),
    ("Financial Services", ["JPM", "BAC", "WFC", "GS", "MS", "C", "AXP", "BLK", "SCHW", "USB"]),
    ("Consumer Cyclical", ["HD", "MCD", "NKE", "SBUX", "TGT", "LOW", "TJX", "MAR", "GM", "F"]),
    ("Consumer Defensive", ["PG", "KO", "PEP", "WMT", "COST", "CL", "KMB", "GIS", "K", "CPB"]),
    ("Utilities", ["NEE", "DUK", "SO", "D", "AEP", "EXC", "SRE", "PEG", "XEL", "ED"]),
    ("Energy", ["XOM", "CVX", "COP", "EOG", "SLB", "PXD", "KMI", "OKE", "WMB", "VLO"]),
    ("Industrials", ["BA", "HON", "UPS", "CAT", "GE", "MMM", "LMT", "RTX", "UNP", "CSX"]),
    ("Materials", ["LIN", "APD", "SHW", "FCX", "NEM", "DOW", "DD", "PPG", "ECL", "IFF"]),
    ("Real Estate", ["AMT", "PLD", "CCI", "EQIX", "SPG", "O", "WELL", "DLR", "PSA", "EQR"]),
    (
        "Communication Services",
        ["T", "VZ", "CMCSA", "DIS", "CHTR", "TMUS", "NFLX", "EA", "ATVI", "TTWO"],
    ),
];

/// Live benchmark table shared between scoring calls and refreshes
#[derive(Debug)]
pub struct SectorBenchmarkStore {
    current: RwLock<Arc<SectorBenchmarks>>,
}

impl Default for SectorBenchmarkStore {
    fn default() -> Self {
        Self::new(SectorBenchmarks::fallback())
    }
}

impl SectorBenchmarkStore {
    pub fn new(table: SectorBenchmarks) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    /// Current table; unaffected by later replacements
    pub fn snapshot(&self) -> Arc<SectorBenchmarks> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a new table, returning the previous one
    pub fn replace(&self, table: SectorBenchmarks) -> Arc<SectorBenchmarks> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(symbol: &str, pe: f64, roe: f64, margin: Option<f64>) -> BenchmarkSample {
        BenchmarkSample {
            symbol: symbol.to_string(),
            pe_ratio: Some(pe),
            price_to_book: Some(pe / 5.0),
            price_to_sales: None,
            return_on_equity: Some(roe),
            profit_margin: margin,
        }
    }

    #[test]
    fn test_fallback_table() {
        let table = SectorBenchmarks::fallback();
        assert_eq!(table.len(), 11);
        assert!(table.is_fallback());
        assert_eq!(table.median("Technology", BenchmarkMetric::PeRatio), Some(25.0));
        assert_eq!(table.median("Energy", BenchmarkMetric::PriceToBook), Some(3.5));
        assert_eq!(table.median("Crypto", BenchmarkMetric::PeRatio), None);
        assert_eq!(table.row_or_fallback("Crypto").pe_ratio, Some(20.0));
    }

    #[test]
    fn test_compute_requires_min_valid_samples() {
        let samples = vec![
            sample("A", 10.0, 0.1, None),
            sample("B", -5.0, 0.1, None),
            sample("C", 30.0, 0.0, None),
        ];
        assert!(compute_sector_benchmark(&samples, 3, "2024-01-01 00:00:00").is_none());
    }

    #[test]
    fn test_compute_uses_lower_median() {
        let samples = vec![
            sample("A", 40.0, 0.30, Some(0.2)),
            sample("B", 10.0, 0.10, Some(0.1)),
            sample("C", 30.0, 0.20, None),
            sample("D", 20.0, 0.15, None),
        ];
        let row = compute_sector_benchmark(&samples, 3, "2024-01-01 00:00:00").unwrap();

        // sorted [10, 20, 30, 40], index 4/2 - 1 = 1
        assert_eq!(row.pe_ratio, Some(20.0));
        assert_eq!(row.return_on_equity, Some(0.15));
        assert_eq!(row.price_to_book, Some(4.0));
        // only two margins
        assert_eq!(row.profit_margin, None);
        assert_eq!(row.price_to_sales, None);

        let info = row.sector_info.unwrap();
        assert_eq!(info.total_stocks_analyzed, 4);
        assert_eq!(info.representative_stocks, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_median_is_rounded() {
        let samples = vec![
            sample("A", 12.34567, 0.1, None),
            sample("B", 15.0, 0.1, None),
            sample("C", 11.0, 0.1, None),
        ];
        let row = compute_sector_benchmark(&samples, 3, "d").unwrap();
        // sorted [11, 12.34567, 15], index 3/2 - 1 = 0
        assert_eq!(row.pe_ratio, Some(11.0));
        assert_eq!(round3(12.34567), 12.346);
    }

    #[test]
    fn test_json_layout() {
        let table = SectorBenchmarks::fallback();
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["_metadata"]["calculation_method"], "static_fallback");
        assert_eq!(json["Healthcare"]["pe_ratio_median"], 18.0);
        assert!(json["Healthcare"].get("_sector_info").is_none());
    }

    #[test]
    fn test_store_swaps_atomically() {
        let store = SectorBenchmarkStore::default();
        let before = store.snapshot();
        assert!(before.is_fallback());

        let mut sectors = BTreeMap::new();
        sectors.insert("Technology".to_string(), SectorBenchmark::new(30.0, 5.0, 7.0, 0.2, 0.15));
        let previous = store.replace(SectorBenchmarks::computed(sectors, "2024-05-01 10:00:00"));

        assert!(Arc::ptr_eq(&before, &previous));
        assert!(before.is_fallback());
        let after = store.snapshot();
        assert!(!after.is_fallback());
        assert_eq!(after.median("Technology", BenchmarkMetric::PeRatio), Some(30.0));
    }
}
