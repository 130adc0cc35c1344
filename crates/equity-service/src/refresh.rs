//! Sector benchmark recomputation
//!
//! Walks the representative companies of every sector one request at a
//! time, keeps those with positive P/E and ROE, and takes sector medians.
//! Sectors without enough usable companies keep their static fallback row.

use crate::error::{Result, ServiceError};
use crate::provider::MarketDataProvider;
use equity_engine::benchmarks::{REPRESENTATIVE_STOCKS, compute_sector_benchmark};
use equity_engine::{BenchmarkMetric, BenchmarkSample, FundamentalsSnapshot, SectorBenchmark, SectorBenchmarks};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Benchmark inputs taken from a fundamentals snapshot
pub fn sample_from(symbol: &str, snapshot: &FundamentalsSnapshot) -> BenchmarkSample {
    let value = |metric: BenchmarkMetric| snapshot.get(metric.into());
    BenchmarkSample {
        symbol: symbol.to_string(),
        pe_ratio: value(BenchmarkMetric::PeRatio),
        price_to_book: value(BenchmarkMetric::PriceToBook),
        price_to_sales: value(BenchmarkMetric::PriceToSales),
        return_on_equity: value(BenchmarkMetric::ReturnOnEquity),
        profit_margin: value(BenchmarkMetric::ProfitMargin),
    }
}

pub struct BenchmarkRefresher {
    provider: Arc<dyn MarketDataProvider>,
    min_valid: usize,
}

impl BenchmarkRefresher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, min_valid: usize) -> Self {
        Self { provider, min_valid }
    }

    async fn sector_samples(&self, sector: &str, symbols: &[&str]) -> Vec<BenchmarkSample> {
        let mut samples = Vec::with_capacity(symbols.len());
        for (i, symbol) in symbols.iter().enumerate() {
            match self.provider.fundamentals(symbol).await {
                Ok(snapshot) => {
                    let sample = sample_from(symbol, &snapshot);
                    if !sample.is_valid() {
                        info!(sector, symbol, "{}/{}: insufficient data", i + 1, symbols.len());
                    }
                    samples.push(sample);
                },
                Err(err) => warn!(sector, symbol, error = %err, "{}/{}: fetch failed", i + 1, symbols.len()),
            }
        }
        samples
    }

    /// Recompute every sector; fails only when no sector yields live medians
    pub async fn compute(&self, calculation_date: &str) -> Result<SectorBenchmarks> {
        info!("Starting calculation of all sector benchmarks");
        let mut sectors = BTreeMap::new();
        let mut computed = 0;

        for (sector, symbols) in &REPRESENTATIVE_STOCKS {
            let samples = self.sector_samples(sector, symbols).await;
            let row = match compute_sector_benchmark(&samples, self.min_valid, calculation_date) {
                Some(row) => {
                    computed += 1;
                    let analysed = row.sector_info.as_ref().map_or(0, |i| i.total_stocks_analyzed);
                    info!(sector, analysed, "Sector benchmarks calculated");
                    row
                },
                None => {
                    warn!(sector, "Insufficient valid data, using fallback");
                    SectorBenchmark::fallback(sector)
                },
            };
            sectors.insert((*sector).to_string(), row);
        }

        if computed == 0 {
            return Err(ServiceError::InsufficientBenchmarkData(
                "no sector had enough valid companies".to_string(),
            ));
        }
        info!(computed, total = sectors.len(), "All sector benchmarks calculated");
        Ok(SectorBenchmarks::computed(sectors, calculation_date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockMarketDataProvider;
    use equity_engine::Metric;

    fn snapshot(pe: f64, roe: f64) -> FundamentalsSnapshot {
        FundamentalsSnapshot::new()
            .with(Metric::PeRatio, pe)
            .with(Metric::ReturnOnEquity, roe)
            .with(Metric::PriceToBook, 3.0)
    }

    #[test]
    fn test_sample_from_snapshot() {
        let sample = sample_from("AAPL", &snapshot(28.0, 1.5));
        assert_eq!(sample.symbol, "AAPL");
        assert_eq!(sample.pe_ratio, Some(28.0));
        assert_eq!(sample.price_to_sales, None);
        assert!(sample.is_valid());
    }

    #[tokio::test]
    async fn test_technology_computed_others_fall_back() {
        let tech: Vec<&str> = REPRESENTATIVE_STOCKS[0].1.to_vec();
        let mut provider = MockMarketDataProvider::new();
        provider.expect_fundamentals().returning(move |symbol| {
            if tech.iter().any(|s| *s == symbol) {
                Ok(snapshot(20.0, 0.2))
            } else {
                Err(ServiceError::upstream(symbol, "unavailable"))
            }
        });

        let refresher = BenchmarkRefresher::new(Arc::new(provider), 3);
        let table = refresher.compute("2024-06-30 12:00:00").await.unwrap();

        assert_eq!(table.len(), REPRESENTATIVE_STOCKS.len());
        assert!(!table.is_fallback());
        let technology = table.get("Technology").unwrap();
        assert_eq!(technology.get(BenchmarkMetric::PeRatio), Some(20.0));
        assert_eq!(technology.sector_info.as_ref().unwrap().total_stocks_analyzed, 10);
        assert_eq!(table.get("Energy"), Some(&SectorBenchmark::fallback("Energy")));
    }

    #[tokio::test]
    async fn test_all_sectors_failing_is_an_error() {
        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_fundamentals()
            .returning(|_| Ok(snapshot(-5.0, 0.1)));

        let refresher = BenchmarkRefresher::new(Arc::new(provider), 3);
        let err = refresher.compute("2024-06-30 12:00:00").await.unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientBenchmarkData(_)));
    }
}
