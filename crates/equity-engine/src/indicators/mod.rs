//! Technical indicator pipeline
//!
//! Derives the 30-day moving average, a smoothed stochastic oscillator and a
//! smoothed MACD from daily OHLC history. Every column is aligned 1:1 with the
//! input dates and computed causally. Rolling windows with fewer observations
//! than their length use what is available.
//!
//! Series shorter than [`MIN_HISTORY`] sessions are returned without derived
//! columns.

pub mod macd;
pub mod stochastic;

use crate::series::{PriceSeries, Series};
use crate::signals::SignalColumns;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

pub use macd::{MacdLines, MacdSpans};
pub use stochastic::{StochasticLines, StochasticWindows, ZERO_RANGE_DENOMINATOR};

/// Sessions required before any indicator is computed
pub const MIN_HISTORY: usize = 30;

/// Window lengths used by [`IndicatorPipeline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorParams {
    pub min_history: usize,
    pub moving_average: usize,
    pub stochastic: StochasticWindows,
    pub macd: MacdSpans,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            min_history: MIN_HISTORY,
            moving_average: 30,
            stochastic: StochasticWindows {
                range: 14,
                k_smoothing: 3,
                d_smoothing: 3,
                d_long: 30,
            },
            macd: MacdSpans {
                fast: 12,
                slow: 26,
                signal: 9,
                smoothing: 15,
            },
        }
    }
}

/// Derived indicator columns, all aligned to the price dates
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorColumns {
    pub moving_average: Series,
    pub percent_k: Series,
    pub percent_d: Series,
    pub smoothed_d: Series,
    pub ema_fast: Series,
    pub ema_slow: Series,
    pub macd: Series,
    pub signal_line: Series,
    pub smoothed_macd: Series,
    pub smoothed_signal: Series,
}

/// Price history together with whatever has been derived from it so far
///
/// Produced by [`IndicatorPipeline::compute`] and extended by
/// [`crate::SignalGenerator::generate`]. Never mutated in place; a refresh
/// builds a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    prices: PriceSeries,
    index: Arc<[NaiveDate]>,
    close: Series,
    indicators: Option<IndicatorColumns>,
    signals: Option<SignalColumns>,
}

impl IndicatorSeries {
    /// Wrap raw prices without any derived columns
    pub fn from_prices(prices: PriceSeries) -> Self {
        let index = prices.date_index();
        let close = prices.close_series(&index);
        Self {
            prices,
            index,
            close,
            indicators: None,
            signals: None,
        }
    }

    /// No sessions, no derived columns
    pub fn empty() -> Self {
        Self::from_prices(PriceSeries::empty())
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn prices(&self) -> &PriceSeries {
        &self.prices
    }

    /// Session dates shared by every column
    pub fn dates(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn close(&self) -> &Series {
        &self.close
    }

    /// Derived columns; `None` when the history was too short
    pub fn indicators(&self) -> Option<&IndicatorColumns> {
        self.indicators.as_ref()
    }

    /// Buy/sell flags, once signal generation has run
    pub fn signals(&self) -> Option<&SignalColumns> {
        self.signals.as_ref()
    }

    pub fn has_indicators(&self) -> bool {
        self.indicators.is_some()
    }

    /// Attach flags of the same length as the prices
    pub(crate) fn with_signals(mut self, signals: SignalColumns) -> Self {
        debug_assert_eq!(signals.len(), self.len());
        self.signals = Some(signals);
        self
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        prices: PriceSeries,
        indicators: Option<IndicatorColumns>,
        signals: Option<SignalColumns>,
    ) -> Self {
        let mut series = Self::from_prices(prices);
        series.indicators = indicators;
        series.signals = signals;
        series
    }
}

/// Computes [`IndicatorColumns`] for a price history
#[derive(Debug, Clone, Default)]
pub struct IndicatorPipeline {
    params: IndicatorParams,
}

impl IndicatorPipeline {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Derive every indicator column for `prices`
    pub fn compute(&self, prices: PriceSeries) -> IndicatorSeries {
        let mut series = IndicatorSeries::from_prices(prices);
        if series.len() < self.params.min_history {
            debug!(
                sessions = series.len(),
                required = self.params.min_history,
                "Insufficient history, skipping indicators"
            );
            return series;
        }

        let high = series.prices.high_series(&series.index);
        let low = series.prices.low_series(&series.index);
        let close = series.close.clone();

        let moving_average = close.rolling_mean(self.params.moving_average);
        let oscillator = stochastic::stochastic(&close, &high, &low, self.params.stochastic);
        let trend = macd::macd(&close, self.params.macd);

        series.indicators = Some(IndicatorColumns {
            moving_average,
            percent_k: oscillator.percent_k,
            percent_d: oscillator.percent_d,
            smoothed_d: oscillator.smoothed_d,
            ema_fast: trend.ema_fast,
            ema_slow: trend.ema_slow,
            macd: trend.macd,
            signal_line: trend.signal_line,
            smoothed_macd: trend.smoothed_macd,
            smoothed_signal: trend.smoothed_signal,
        });
        series
    }
}

/// Run the default pipeline
pub fn compute_indicators(prices: PriceSeries) -> IndicatorSeries {
    IndicatorPipeline::default().compute(prices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::PricePoint;

    fn prices(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        PriceSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| {
                    PricePoint::new(start + chrono::Duration::days(i as i64), c, c + 1.0, c - 1.0, c)
                })
                .collect(),
        )
    }

    #[test]
    fn test_short_history_has_no_columns() {
        let series = compute_indicators(prices(&[10.0; 29]));
        assert_eq!(series.len(), 29);
        assert!(series.indicators().is_none());
        assert!(series.signals().is_none());
    }

    #[test]
    fn test_columns_align_with_prices() {
        let closes: Vec<f64> = (0..45).map(|i| 20.0 + f64::from(i % 7)).collect();
        let series = compute_indicators(prices(&closes));
        let columns = series.indicators().unwrap();

        for column in [
            &columns.moving_average,
            &columns.percent_k,
            &columns.smoothed_d,
            &columns.macd,
            &columns.smoothed_signal,
        ] {
            assert_eq!(column.len(), 45);
            assert!(column.is_aligned_with(series.close()));
        }
    }

    #[test]
    fn test_moving_average_expands_before_window_fills() {
        let closes: Vec<f64> = (1..=35).map(f64::from).collect();
        let series = compute_indicators(prices(&closes));
        let ma = &series.indicators().unwrap().moving_average;

        assert_eq!(ma.values()[0], 1.0);
        assert_eq!(ma.values()[1], 1.5);
        // full window: mean of 6..=35
        assert!((ma.values()[34] - 20.5).abs() < 1e-9);
    }

    #[test]
    fn test_custom_params() {
        let params = IndicatorParams {
            min_history: 5,
            ..IndicatorParams::default()
        };
        let series = IndicatorPipeline::new(params).compute(prices(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        assert!(series.has_indicators());
    }
}
