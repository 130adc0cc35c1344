//! Yahoo Finance API client

use crate::error::{Result, ServiceError};
use chrono::{DateTime, Utc};
use equity_engine::{PricePoint, PriceSeries};
use time::OffsetDateTime;
use tracing::{debug, info};
use yahoo_finance_api as yahoo;

/// Yahoo Finance API client
#[derive(Debug, Clone, Default)]
pub struct YahooFinanceClient {}

impl YahooFinanceClient {
    pub fn new() -> Self {
        Self {}
    }

    fn connector(symbol: &str) -> Result<yahoo::YahooConnector> {
        yahoo::YahooConnector::new().map_err(|e| ServiceError::upstream(symbol, e))
    }

    /// Daily bars for the last `lookback_days`, split and dividend adjusted
    pub async fn history(&self, symbol: &str, lookback_days: u32) -> Result<PriceSeries> {
        let end = Utc::now();
        let start = end - chrono::Duration::days(i64::from(lookback_days));

        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| ServiceError::upstream(symbol, format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| ServiceError::upstream(symbol, format!("Invalid end timestamp: {e}")))?;

        info!(symbol, lookback_days, "Fetching price history");
        let response = Self::connector(symbol)?
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| ServiceError::upstream(symbol, e))?;

        let quotes = response
            .quotes()
            .map_err(|e| ServiceError::upstream(symbol, e))?;

        let points: Vec<PricePoint> = quotes
            .iter()
            .filter_map(|q| {
                adjusted_point(
                    i64::try_from(q.timestamp).ok()?,
                    q.open,
                    q.high,
                    q.low,
                    q.close,
                    q.adjclose,
                )
            })
            .collect();
        debug!(symbol, bars = points.len(), "Price history received");

        Ok(PriceSeries::new(points))
    }

    /// Company name for `symbol`, or `None` when the search has no exact match
    pub async fn lookup(&self, symbol: &str) -> Result<Option<String>> {
        let result = Self::connector(symbol)?
            .search_ticker(symbol)
            .await
            .map_err(|e| ServiceError::upstream(symbol, e))?;

        Ok(result
            .quotes
            .iter()
            .find(|item| item.symbol.eq_ignore_ascii_case(symbol))
            .map(|item| {
                [&item.long_name, &item.short_name]
                    .into_iter()
                    .find(|name| !name.trim().is_empty())
                    .map_or_else(|| symbol.to_string(), |name| name.trim().to_string())
            }))
    }
}

/// Bar scaled by `adjclose / close`; rows with a bad timestamp or close are dropped
fn adjusted_point(timestamp: i64, open: f64, high: f64, low: f64, close: f64, adjclose: f64) -> Option<PricePoint> {
    let date = DateTime::from_timestamp(timestamp, 0)?.date_naive();
    if !(close.is_finite() && close > 0.0) {
        return None;
    }
    let factor = if adjclose.is_finite() && adjclose > 0.0 {
        adjclose / close
    } else {
        1.0
    };
    Some(PricePoint::new(
        date,
        open * factor,
        high * factor,
        low * factor,
        close * factor,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_adjusted_point_scales_bar() {
        let point = adjusted_point(1_704_205_800, 100.0, 110.0, 90.0, 100.0, 50.0).unwrap();
        assert_eq!(point.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(point.open, 50.0);
        assert_eq!(point.high, 55.0);
        assert_eq!(point.low, 45.0);
        assert_eq!(point.close, 50.0);
    }

    #[test]
    fn test_adjusted_point_rejects_bad_rows() {
        assert!(adjusted_point(1_704_205_800, 1.0, 1.0, 1.0, 0.0, 1.0).is_none());
        assert!(adjusted_point(1_704_205_800, 1.0, 1.0, 1.0, f64::NAN, 1.0).is_none());

        let unadjusted = adjusted_point(1_704_205_800, 9.0, 11.0, 8.0, 10.0, 0.0).unwrap();
        assert_eq!(unadjusted.close, 10.0);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_history() {
        let client = YahooFinanceClient::new();
        let series = client.history("AAPL", 60).await.unwrap();
        assert!(series.len() > 30);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_lookup() {
        let client = YahooFinanceClient::new();
        assert!(client.lookup("AAPL").await.unwrap().is_some());
        assert!(client.lookup("INVALID_SYMBOL_12345").await.unwrap().is_none());
    }
}
