//! Request-level orchestration
//!
//! [`AnalysisService`] owns everything with state: the per-symbol cache, the
//! live benchmark table, the portfolio file. The engine stays pure; each
//! request fetches (or reuses) raw data, then scores it against whatever
//! benchmark table is current at that moment.

use crate::cache::SymbolCache;
use crate::clock::{Clock, SystemClock};
use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::portfolio::{PortfolioEntry, PortfolioStore, normalize_symbol};
use crate::provider::{LiveProvider, MarketDataProvider};
use crate::refresh::BenchmarkRefresher;
use crate::report::{BenchmarkData, BenchmarkStatus, RefreshSummary, RepresentativeStocks, StockReport, formatted_metrics};
use crate::store::BenchmarkFile;
use equity_engine::{
    ChartData, FundamentalsSnapshot, IndicatorPipeline, IndicatorSeries, ScoringStrategy, SectorBenchmarkStore,
    SectorBenchmarks, SignalGenerator, chart_data, technical_call,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything fetched and derived for one symbol
#[derive(Debug, Clone)]
pub struct SymbolData {
    pub series: IndicatorSeries,
    pub fundamentals: FundamentalsSnapshot,
}

pub struct AnalysisService {
    config: ServiceConfig,
    provider: Arc<dyn MarketDataProvider>,
    clock: Arc<dyn Clock>,
    cache: SymbolCache<Arc<SymbolData>>,
    benchmarks: SectorBenchmarkStore,
    benchmark_file: BenchmarkFile,
    portfolio: PortfolioStore,
    strategy: Box<dyn ScoringStrategy>,
    pipeline: IndicatorPipeline,
    signals: SignalGenerator,
    refresh_lock: Mutex<()>,
}

impl AnalysisService {
    /// Build against the live Yahoo Finance / Alpha Vantage provider
    pub async fn from_config(config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        let provider = Arc::new(LiveProvider::from_config(&config)?);
        Ok(Self::new(config, provider, Arc::new(SystemClock)).await)
    }

    /// Build with an explicit provider and clock; loads the benchmark file
    pub async fn new(config: ServiceConfig, provider: Arc<dyn MarketDataProvider>, clock: Arc<dyn Clock>) -> Self {
        let benchmark_file = BenchmarkFile::new(&config.benchmarks_path);
        let benchmarks = SectorBenchmarkStore::new(benchmark_file.load().await);

        Self {
            cache: SymbolCache::new(config.cache_ttl, Arc::clone(&clock)),
            portfolio: PortfolioStore::new(&config.portfolio_path),
            strategy: config.strategy.strategy(),
            pipeline: IndicatorPipeline::default(),
            signals: SignalGenerator::default(),
            refresh_lock: Mutex::new(()),
            benchmark_file,
            benchmarks,
            provider,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Benchmark table currently used for scoring
    pub fn benchmarks(&self) -> Arc<SectorBenchmarks> {
        self.benchmarks.snapshot()
    }

    async fn fetch_symbol(&self, symbol: &str) -> Result<Arc<SymbolData>> {
        info!(symbol, "Fetching fresh data");
        let (prices, fundamentals) = tokio::join!(
            self.provider.price_history(symbol, self.config.history_days),
            self.provider.fundamentals(symbol),
        );
        let prices = prices?;

        let mut fundamentals = match fundamentals {
            Ok(snapshot) => snapshot,
            Err(err) if err.is_retryable() => return Err(err),
            Err(err) => {
                warn!(symbol, error = %err, "Fundamentals unavailable");
                FundamentalsSnapshot::new()
            },
        };

        match self.provider.quarterly_financials(symbol).await {
            Ok(quarters) => fundamentals.merge_growth(&quarters.growth_metrics()),
            Err(err) => warn!(symbol, error = %err, "Quarterly statements unavailable"),
        }

        let series = self.signals.generate(self.pipeline.compute(prices));
        info!(symbol, sessions = series.len(), "Data fetch completed");
        Ok(Arc::new(SymbolData { series, fundamentals }))
    }

    async fn symbol_data(&self, symbol: &str) -> Result<crate::cache::CachedValue<Arc<SymbolData>>> {
        self.cache
            .get_or_fetch(symbol, || self.fetch_symbol(symbol))
            .await
    }

    /// Score, tally and fuse one symbol
    pub async fn analyze(&self, symbol: &str) -> Result<StockReport> {
        let symbol = normalize_symbol(symbol)?;
        let cached = self.symbol_data(&symbol).await?;
        let data = &cached.value;

        let benchmarks = self.benchmarks.snapshot();
        let score = self.strategy.score_fundamentals(&data.fundamentals, &benchmarks);
        let technical = technical_call(&data.series, self.config.technical_window);
        let overall = self.strategy.fuse_recommendation(&score, technical);

        Ok(StockReport {
            company_name: data.fundamentals.company_name().map(str::to_string),
            fundamental_metrics: formatted_metrics(&data.fundamentals),
            fundamental_analysis: score,
            technical_recommendation: technical,
            overall_recommendation: overall,
            last_updated: cached.fetched_at.format(TIMESTAMP_FORMAT).to_string(),
            freshness: cached.freshness,
            symbol,
        })
    }

    /// Analyse every portfolio symbol in order; one failure does not stop the rest
    pub async fn analyze_portfolio(&self) -> Result<Vec<(PortfolioEntry, Result<StockReport>)>> {
        let mut reports = Vec::new();
        for entry in self.portfolio.list().await? {
            let report = self.analyze(&entry.symbol).await;
            reports.push((entry, report));
        }
        Ok(reports)
    }

    /// Panel data for the chart renderer
    pub async fn chart(&self, symbol: &str) -> Result<ChartData> {
        let symbol = normalize_symbol(symbol)?;
        let cached = self.symbol_data(&symbol).await?;
        chart_data(&symbol, &cached.value.series).ok_or(ServiceError::NoData(symbol))
    }

    pub async fn portfolio(&self) -> Result<Vec<PortfolioEntry>> {
        self.portfolio.list().await
    }

    /// Validate `symbol` with the provider and track it
    pub async fn add_to_portfolio(&self, symbol: &str) -> Result<PortfolioEntry> {
        let symbol = normalize_symbol(symbol)?;
        if self.portfolio.contains(&symbol).await? {
            return Err(ServiceError::AlreadyInPortfolio(symbol));
        }

        let name = self.provider.company_name(&symbol).await?;
        let entry = PortfolioEntry {
            symbol: symbol.clone(),
            name,
            date_added: self.clock.now().format("%Y-%m-%d").to_string(),
        };
        let entry = self.portfolio.add(entry).await?;
        self.cache.invalidate(&symbol).await;
        Ok(entry)
    }

    pub async fn remove_from_portfolio(&self, symbol: &str) -> Result<()> {
        let symbol = normalize_symbol(symbol)?;
        self.portfolio.remove(&symbol).await?;
        self.cache.invalidate(&symbol).await;
        Ok(())
    }

    /// Recompute sector medians, persist them, then swap the live table
    ///
    /// Scoring keeps using the previous table until the new one is saved.
    /// Concurrent refreshes queue behind each other.
    pub async fn refresh_benchmarks(&self) -> Result<RefreshSummary> {
        let _guard = self.refresh_lock.lock().await;
        info!("Starting sector benchmark calculation");

        let calculated_at = self.clock.now().format(TIMESTAMP_FORMAT).to_string();
        let refresher = BenchmarkRefresher::new(Arc::clone(&self.provider), self.config.min_valid_stocks);
        let table = refresher.compute(&calculated_at).await?;

        self.benchmark_file.save(&table).await?;
        let sectors_calculated: Vec<String> = table.sector_names().map(str::to_string).collect();
        self.benchmarks.replace(table);

        Ok(RefreshSummary {
            total_sectors: sectors_calculated.len(),
            sectors_calculated,
            last_updated: calculated_at,
            file_saved: self.benchmark_file.path().display().to_string(),
        })
    }

    pub async fn benchmark_status(&self) -> BenchmarkStatus {
        BenchmarkStatus {
            file_status: self.benchmark_file.status().await,
            benchmark_data: BenchmarkData::from(&*self.benchmarks.snapshot()),
            representative_stocks: RepresentativeStocks::current(),
        }
    }
}
