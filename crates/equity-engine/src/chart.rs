//! Chart data for an external renderer
//!
//! Three stacked panels: close with its moving average, the smoothed
//! stochastic %D against 30/70 guides, and smoothed MACD against its signal
//! line around a zero line. Buy/sell marker dates come from the signal
//! columns when present.

use crate::indicators::IndicatorSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const OVERBOUGHT: f64 = 70.0;
pub const OVERSOLD: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub label: String,
    pub values: Vec<f64>,
}

impl Line {
    fn new(label: &str, values: &[f64]) -> Self {
        Self {
            label: label.to_string(),
            values: values.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub title: String,
    pub y_label: String,
    pub lines: Vec<Line>,
    /// Horizontal reference levels
    pub guides: Vec<f64>,
    /// Fixed y-axis range, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_range: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub panels: Vec<Panel>,
    pub buy_dates: Vec<NaiveDate>,
    pub sell_dates: Vec<NaiveDate>,
}

/// Build chart panels; `None` when the series is empty or has no indicators
pub fn chart_data(symbol: &str, series: &IndicatorSeries) -> Option<ChartData> {
    if series.is_empty() {
        return None;
    }
    let columns = series.indicators()?;

    let price = Panel {
        title: format!("{symbol} - Price and Moving Average"),
        y_label: "Price ($)".to_string(),
        lines: vec![
            Line::new("Close Price", series.close().values()),
            Line::new("30-Day MA", columns.moving_average.values()),
        ],
        guides: Vec::new(),
        y_range: None,
    };
    let stochastic = Panel {
        title: format!("{symbol} - Stochastic Oscillator"),
        y_label: "Stochastic %D".to_string(),
        lines: vec![Line::new("Stochastic %D", columns.smoothed_d.values())],
        guides: vec![OVERBOUGHT, OVERSOLD],
        y_range: Some((0.0, 100.0)),
    };
    let macd = Panel {
        title: format!("{symbol} - MACD"),
        y_label: "MACD".to_string(),
        lines: vec![
            Line::new("MACD", columns.smoothed_macd.values()),
            Line::new("Signal Line", columns.smoothed_signal.values()),
        ],
        guides: vec![0.0],
        y_range: None,
    };

    let dates = series.dates().to_vec();
    let marked = |flags: &[bool]| -> Vec<NaiveDate> {
        dates
            .iter()
            .zip(flags)
            .filter(|(_, flag)| **flag)
            .map(|(date, _)| *date)
            .collect()
    };
    let (buy_dates, sell_dates) = series
        .signals()
        .map(|s| (marked(&s.buy_signal), marked(&s.sell_signal)))
        .unwrap_or_default();

    Some(ChartData {
        symbol: symbol.to_string(),
        dates,
        panels: vec![price, stochastic, macd],
        buy_dates,
        sell_dates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::compute_indicators;
    use crate::series::{PricePoint, PriceSeries};
    use crate::signals::generate_signals;

    fn prices(len: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        PriceSeries::new(
            (0..len)
                .map(|i| {
                    let close = 100.0 + (i as f64 * 0.3).sin() * 5.0;
                    PricePoint::new(
                        start + chrono::Duration::days(i as i64),
                        close,
                        close + 1.0,
                        close - 1.0,
                        close,
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn test_no_chart_without_indicators() {
        assert!(chart_data("AAPL", &compute_indicators(prices(10))).is_none());
        assert!(chart_data("AAPL", &IndicatorSeries::empty()).is_none());
    }

    #[test]
    fn test_panels_align_with_dates() {
        let series = generate_signals(compute_indicators(prices(60)));
        let chart = chart_data("MSFT", &series).unwrap();

        assert_eq!(chart.panels.len(), 3);
        assert_eq!(chart.panels[1].guides, vec![70.0, 30.0]);
        for panel in &chart.panels {
            for line in &panel.lines {
                assert_eq!(line.values.len(), chart.dates.len());
            }
        }
        assert!(chart.buy_dates.iter().all(|d| chart.dates.contains(d)));
    }
}
