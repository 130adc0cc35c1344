//! Market data provider abstraction
//!
//! The service only talks to [`MarketDataProvider`]. [`LiveProvider`] combines
//! Yahoo Finance (daily history, symbol lookup) with Alpha Vantage (company
//! overview, quarterly statements). Without an Alpha Vantage key fundamentals
//! come back empty and scoring degrades to its empty-snapshot output.

use crate::api::{AlphaVantageClient, YahooFinanceClient};
use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use equity_engine::{FundamentalsSnapshot, PriceSeries, QuarterlyFinancials};
use tracing::{debug, warn};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Daily OHLC history covering the last `lookback_days` calendar days
    async fn price_history(&self, symbol: &str, lookback_days: u32) -> Result<PriceSeries>;

    /// Point-in-time fundamentals
    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot>;

    /// Quarterly statement lines, most recent first
    async fn quarterly_financials(&self, symbol: &str) -> Result<QuarterlyFinancials>;

    /// Display name; `InvalidSymbol` when the provider does not know the ticker
    async fn company_name(&self, symbol: &str) -> Result<String>;
}

/// Yahoo Finance for prices, Alpha Vantage for fundamentals when configured
#[derive(Debug, Clone)]
pub struct LiveProvider {
    yahoo: YahooFinanceClient,
    alpha_vantage: Option<AlphaVantageClient>,
}

impl LiveProvider {
    pub fn new(yahoo: YahooFinanceClient, alpha_vantage: Option<AlphaVantageClient>) -> Self {
        Self { yahoo, alpha_vantage }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let alpha_vantage = config
            .alpha_vantage_api_key
            .as_ref()
            .map(|key| AlphaVantageClient::new(key, config.rate_limit_per_minute, config.request_timeout))
            .transpose()?;
        if alpha_vantage.is_none() {
            warn!("ALPHA_VANTAGE_API_KEY not set, fundamentals will be empty");
        }
        Ok(Self::new(YahooFinanceClient::new(), alpha_vantage))
    }
}

#[async_trait]
impl MarketDataProvider for LiveProvider {
    async fn price_history(&self, symbol: &str, lookback_days: u32) -> Result<PriceSeries> {
        self.yahoo.history(symbol, lookback_days).await
    }

    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot> {
        match &self.alpha_vantage {
            Some(client) => {
                let mut snapshot = client.company_overview(symbol).await?;
                match client.balance_sheet_ratios(symbol).await {
                    Ok(ratios) => ratios.apply(&mut snapshot),
                    Err(err) => warn!(symbol, error = %err, "Balance sheet unavailable"),
                }
                Ok(snapshot)
            },
            None => {
                debug!(symbol, "No fundamentals source configured");
                Ok(FundamentalsSnapshot::new())
            },
        }
    }

    async fn quarterly_financials(&self, symbol: &str) -> Result<QuarterlyFinancials> {
        match &self.alpha_vantage {
            Some(client) => client.quarterly_financials(symbol).await,
            None => Ok(QuarterlyFinancials::default()),
        }
    }

    async fn company_name(&self, symbol: &str) -> Result<String> {
        match self.yahoo.lookup(symbol).await {
            Ok(Some(name)) => Ok(name),
            Ok(None) => Err(ServiceError::InvalidSymbol(symbol.to_string())),
            Err(err) => {
                let Some(client) = &self.alpha_vantage else {
                    return Err(err);
                };
                warn!(symbol, error = %err, "Yahoo lookup failed, trying Alpha Vantage");
                let overview = client.company_overview(symbol).await?;
                Ok(overview.company_name().unwrap_or(symbol).to_string())
            },
        }
    }
}
