//! Alpha Vantage API client
//!
//! Company overview and quarterly statements. All numbers arrive as strings,
//! with `"None"` or `"-"` for missing values.

use crate::error::{Result, ServiceError};
use equity_engine::{FundamentalsSnapshot, Metric, QuarterlyFinancials};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER: &str = "Alpha Vantage";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// OVERVIEW fields and the metric each one fills
const OVERVIEW_FIELDS: [(&str, Metric); 19] = [
    ("MarketCapitalization", Metric::MarketCap),
    ("SharesOutstanding", Metric::SharesOutstanding),
    ("PERatio", Metric::PeRatio),
    ("ForwardPE", Metric::ForwardPe),
    ("PEGRatio", Metric::PegRatio),
    ("PriceToBookRatio", Metric::PriceToBook),
    ("PriceToSalesRatioTTM", Metric::PriceToSales),
    ("EVToRevenue", Metric::EvToRevenue),
    ("EVToEBITDA", Metric::EvToEbitda),
    ("ProfitMargin", Metric::ProfitMargin),
    ("OperatingMarginTTM", Metric::OperatingMargin),
    ("ReturnOnAssetsTTM", Metric::ReturnOnAssets),
    ("ReturnOnEquityTTM", Metric::ReturnOnEquity),
    ("QuarterlyRevenueGrowthYOY", Metric::RevenueGrowth),
    ("QuarterlyEarningsGrowthYOY", Metric::EarningsGrowth),
    ("DividendYield", Metric::DividendYield),
    ("Beta", Metric::Beta),
    ("52WeekHigh", Metric::FiftyTwoWeekHigh),
    ("52WeekLow", Metric::FiftyTwoWeekLow),
];

/// Alpha Vantage API client
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

impl AlphaVantageClient {
    /// Create a client allowing `rate_limit` requests per minute (5 on the free tier)
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    async fn query(&self, function: &str, symbol: &str) -> Result<Value> {
        self.rate_limiter.until_ready().await;
        debug!(function, symbol, "Alpha Vantage request");

        let params = [("function", function), ("symbol", symbol), ("apikey", self.api_key.as_str())];
        let response = self.client.get(BASE_URL).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(ServiceError::upstream(symbol, format!("HTTP error: {}", response.status())));
        }

        let data: Value = response.json().await?;
        check_response(symbol, data)
    }

    /// OVERVIEW as a fundamentals snapshot; `InvalidSymbol` for an empty reply
    pub async fn company_overview(&self, symbol: &str) -> Result<FundamentalsSnapshot> {
        info!(symbol, "Fetching company overview");
        let data = self.query("OVERVIEW", symbol).await?;
        if data.as_object().is_none_or(serde_json::Map::is_empty) {
            return Err(ServiceError::InvalidSymbol(symbol.to_string()));
        }
        Ok(overview_snapshot(&data))
    }

    /// Leverage and liquidity from the latest quarterly balance sheet
    pub async fn balance_sheet_ratios(&self, symbol: &str) -> Result<BalanceSheetRatios> {
        let data = self.query("BALANCE_SHEET", symbol).await?;
        Ok(latest_report(&data).map(BalanceSheetRatios::from_report).unwrap_or_default())
    }

    /// Income, cash flow and balance sheet lines needed for growth derivation
    pub async fn quarterly_financials(&self, symbol: &str) -> Result<QuarterlyFinancials> {
        info!(symbol, "Fetching quarterly statements");
        let income = self.query("INCOME_STATEMENT", symbol).await?;
        let cash_flow = self.query("CASH_FLOW", symbol).await?;
        let balance = self.query("BALANCE_SHEET", symbol).await?;

        Ok(QuarterlyFinancials {
            total_revenue: quarterly_series(&income, "totalRevenue"),
            operating_cash_flow: quarterly_series(&cash_flow, "operatingCashflow"),
            net_income: quarterly_series(&income, "netIncome"),
            stockholders_equity: quarterly_series(&balance, "totalShareholderEquity"),
        })
    }
}

fn check_response(symbol: &str, data: Value) -> Result<Value> {
    if let Some(error) = data.get("Error Message") {
        return Err(ServiceError::upstream(symbol, error));
    }
    if data.get("Note").is_some() || data.get("Information").is_some() {
        return Err(ServiceError::RateLimited {
            provider: PROVIDER.to_string(),
        });
    }
    Ok(data)
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn text(data: &Value, field: &str) -> Option<String> {
    data.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "None" && *s != "-")
        .map(str::to_string)
}

fn overview_snapshot(data: &Value) -> FundamentalsSnapshot {
    let mut snapshot: FundamentalsSnapshot = OVERVIEW_FIELDS
        .iter()
        .filter_map(|(field, metric)| data.get(*field).and_then(number).map(|v| (*metric, v)))
        .collect();

    snapshot.set_company_name(text(data, "Name"));
    snapshot.set_sector(text(data, "Sector").map(|s| normalize_sector(&s)));
    snapshot.set_industry(text(data, "Industry"));
    snapshot.set_country(text(data, "Country"));
    snapshot
}

/// Map Alpha Vantage sector names onto the benchmark table's names
pub fn normalize_sector(raw: &str) -> String {
    match raw.trim().to_ascii_uppercase().as_str() {
        "TECHNOLOGY" => "Technology".to_string(),
        "LIFE SCIENCES" | "HEALTHCARE" => "Healthcare".to_string(),
        "FINANCE" | "FINANCIAL SERVICES" => "Financial Services".to_string(),
        "TRADE & SERVICES" => "Consumer Cyclical".to_string(),
        "MANUFACTURING" => "Industrials".to_string(),
        "ENERGY & TRANSPORTATION" => "Energy".to_string(),
        "REAL ESTATE & CONSTRUCTION" => "Real Estate".to_string(),
        _ => title_case(raw.trim()),
    }
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn reports(data: &Value) -> &[Value] {
    data.get("quarterlyReports")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn latest_report(data: &Value) -> Option<&Value> {
    reports(data).first()
}

/// One line across the quarterly reports, most recent first
fn quarterly_series(data: &Value, field: &str) -> Vec<Option<f64>> {
    reports(data)
        .iter()
        .map(|report| report.get(field).and_then(number))
        .collect()
}

/// Ratios derived from a single balance sheet
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BalanceSheetRatios {
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub total_debt: Option<f64>,
    pub total_cash: Option<f64>,
}

impl BalanceSheetRatios {
    fn from_report(report: &Value) -> Self {
        let field = |name: &str| report.get(name).and_then(number);

        let total_debt = field("shortLongTermDebtTotal").or_else(|| {
            match (field("longTermDebt"), field("shortTermDebt")) {
                (None, None) => None,
                (long, short) => Some(long.unwrap_or(0.0) + short.unwrap_or(0.0)),
            }
        });
        let equity = field("totalShareholderEquity").filter(|e| *e != 0.0);
        let liabilities = field("totalCurrentLiabilities").filter(|l| *l != 0.0);

        Self {
            debt_to_equity: total_debt.zip(equity).map(|(debt, equity)| debt / equity),
            current_ratio: field("totalCurrentAssets")
                .zip(liabilities)
                .map(|(assets, liabilities)| assets / liabilities),
            total_debt,
            total_cash: field("cashAndCashEquivalentsAtCarryingValue"),
        }
    }

    /// Fill the snapshot; metrics already present are kept
    pub fn apply(&self, snapshot: &mut FundamentalsSnapshot) {
        let derived = [
            (Metric::DebtToEquity, self.debt_to_equity),
            (Metric::CurrentRatio, self.current_ratio),
            (Metric::TotalDebt, self.total_debt),
            (Metric::TotalCash, self.total_cash),
        ];
        for (metric, value) in derived {
            if snapshot.get(metric).is_none() && value.is_some() {
                snapshot.set(metric, value);
            }
        }
    }
}
