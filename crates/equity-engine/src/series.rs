//! Price history and aligned numeric series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use ta::Next;
use ta::indicators::{Maximum, Minimum};

/// One daily trading session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PricePoint {
    /// Session with the given OHLC prices
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
        }
    }

    fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Daily OHLC history ordered by strictly increasing date
///
/// Construction normalises provider output: rows with a missing (non-finite)
/// price are dropped, rows are sorted by date, and when a date repeats the
/// later row wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Normalise provider rows into a date-ordered series
    pub fn new(points: Vec<PricePoint>) -> Self {
        let mut points: Vec<PricePoint> = points.into_iter().filter(PricePoint::is_complete).collect();
        points.sort_by_key(|p| p.date);

        let mut normalized: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match normalized.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => normalized.push(point),
            }
        }

        Self { points: normalized }
    }

    /// History with no sessions
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sessions, oldest first
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Most recent session
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Shared date index for building aligned [`Series`]
    pub fn date_index(&self) -> Arc<[NaiveDate]> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Close prices as a [`Series`] over [`Self::date_index`]
    pub fn close_series(&self, index: &Arc<[NaiveDate]>) -> Series {
        self.column(index, |p| p.close)
    }

    /// Daily highs over `index`
    pub fn high_series(&self, index: &Arc<[NaiveDate]>) -> Series {
        self.column(index, |p| p.high)
    }

    /// Daily lows over `index`
    pub fn low_series(&self, index: &Arc<[NaiveDate]>) -> Series {
        self.column(index, |p| p.low)
    }

    fn column(&self, index: &Arc<[NaiveDate]>, field: impl Fn(&PricePoint) -> f64) -> Series {
        debug_assert_eq!(index.len(), self.points.len());
        Series {
            index: Arc::clone(index),
            values: self.points.iter().map(field).collect(),
        }
    }

    /// Close prices, oldest first
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.low).collect()
    }
}

impl From<Vec<PricePoint>> for PriceSeries {
    fn from(points: Vec<PricePoint>) -> Self {
        Self::new(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}

/// A numeric column aligned to a shared date index
///
/// Every rolling operation is causal: the value at position `i` only uses
/// observations `0..=i`. Windows that do not yet have enough history use the
/// observations available so far.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    index: Arc<[NaiveDate]>,
    values: Vec<f64>,
}

impl Series {
    /// Build a series, returning `None` when `values` does not match the index length
    pub fn new(index: Arc<[NaiveDate]>, values: Vec<f64>) -> Option<Self> {
        (index.len() == values.len()).then_some(Self { index, values })
    }

    fn with_values(&self, values: Vec<f64>) -> Self {
        debug_assert_eq!(self.index.len(), values.len());
        Self {
            index: Arc::clone(&self.index),
            values,
        }
    }

    /// Number of values, equal to the index length
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Dates the values are aligned to
    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at `position`; `None` past the end, NaN inside the warm-up
    pub fn get(&self, position: usize) -> Option<f64> {
        self.values.get(position).copied()
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// True when both series share the same date index
    pub fn is_aligned_with(&self, other: &Series) -> bool {
        Arc::ptr_eq(&self.index, &other.index) || self.index == other.index
    }

    /// Apply `f` to every value, keeping the index
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Series {
        self.with_values(self.values.iter().map(|&v| f(v)).collect())
    }

    /// Element-wise combination of two aligned series
    pub fn combine(&self, other: &Series, f: impl Fn(f64, f64) -> f64) -> Series {
        debug_assert!(self.is_aligned_with(other), "series must share a date index");
        self.with_values(
            self.values
                .iter()
                .zip(other.values.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        )
    }

    /// Rolling arithmetic mean over `window` observations (expanding until full)
    ///
    /// Each mean is taken over its own window as the first observation plus
    /// the average offset from it, so a constant window yields exactly that
    /// constant and no error carries over from earlier windows.
    pub fn rolling_mean(&self, window: usize) -> Series {
        if window == 0 {
            return self.clone();
        }
        let values = (0..self.values.len())
            .map(|i| window_mean(&self.values[(i + 1).saturating_sub(window)..=i]))
            .collect();
        self.with_values(values)
    }

    /// Rolling maximum over `window` observations (expanding until full)
    pub fn rolling_max(&self, window: usize) -> Series {
        match Maximum::new(window) {
            Ok(mut max) => self.with_values(self.values.iter().map(|&v| max.next(v)).collect()),
            Err(_) => self.clone(),
        }
    }

    /// Rolling minimum over `window` observations (expanding until full)
    pub fn rolling_min(&self, window: usize) -> Series {
        match Minimum::new(window) {
            Ok(mut min) => self.with_values(self.values.iter().map(|&v| min.next(v)).collect()),
            Err(_) => self.clone(),
        }
    }

    /// Exponentially weighted mean with `alpha = 2 / (span + 1)`
    ///
    /// Seeded with the first observation, without bias adjustment.
    pub fn ewm_mean(&self, span: usize) -> Series {
        let alpha = 2.0 / (span as f64 + 1.0);
        let mut previous: Option<f64> = None;
        let values = self
            .values
            .iter()
            .map(|&value| {
                let next = match previous {
                    None => value,
                    Some(prev) => prev + alpha * (value - prev),
                };
                previous = Some(next);
                next
            })
            .collect();
        self.with_values(values)
    }
}

fn window_mean(window: &[f64]) -> f64 {
    let Some(&base) = window.first() else {
        return f64::NAN;
    };
    base + window.iter().map(|v| v - base).sum::<f64>() / window.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset)
    }

    fn series(values: &[f64]) -> Series {
        let index: Arc<[NaiveDate]> = (0..values.len() as i64).map(day).collect();
        Series::new(index, values.to_vec()).unwrap()
    }

    #[test]
    fn test_price_series_normalizes_order_and_duplicates() {
        let points = vec![
            PricePoint::new(day(2), 3.0, 3.0, 3.0, 3.0),
            PricePoint::new(day(0), 1.0, 1.0, 1.0, 1.0),
            PricePoint::new(day(1), 2.0, 2.0, 2.0, 2.0),
            PricePoint::new(day(1), 2.5, 2.5, 2.5, 2.5),
            PricePoint::new(day(3), f64::NAN, 4.0, 4.0, 4.0),
        ];
        let prices = PriceSeries::new(points);

        assert_eq!(prices.len(), 3);
        assert_eq!(prices.closes(), vec![1.0, 2.5, 3.0]);
        assert!(prices.points().windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_series_rejects_misaligned_values() {
        let index: Arc<[NaiveDate]> = (0..3).map(day).collect();
        assert!(Series::new(index, vec![1.0, 2.0]).is_none());
    }

    #[test]
    fn test_rolling_mean_expands_until_window_is_full() {
        let mean = series(&[1.0, 2.0, 3.0, 4.0, 5.0]).rolling_mean(3);
        assert_eq!(mean.values(), &[1.0, 1.5, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_rolling_mean_of_constant_is_exact() {
        for price in [100.37, 0.1, 17.83, 123.456, 3.3, 251.09] {
            let mean = series(&[price; 60]).rolling_mean(30);
            assert!(mean.values().iter().all(|&v| v == price), "drift at {price}");
        }
    }

    #[test]
    fn test_rolling_extremes() {
        let s = series(&[3.0, 1.0, 4.0, 1.0, 5.0, 2.0]);
        assert_eq!(s.rolling_max(3).values(), &[3.0, 3.0, 4.0, 4.0, 5.0, 5.0]);
        assert_eq!(s.rolling_min(3).values(), &[3.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_ewm_mean_seeds_with_first_value() {
        let ema = series(&[10.0, 20.0]).ewm_mean(3);
        // alpha = 0.5
        assert_eq!(ema.values(), &[10.0, 15.0]);
    }

    #[test]
    fn test_ewm_mean_of_constant_is_constant() {
        let ema = series(&[42.5; 50]).ewm_mean(26);
        assert!(ema.values().iter().all(|&v| v == 42.5));
    }

    #[test]
    fn test_combine_keeps_alignment() {
        let a = series(&[1.0, 2.0, 3.0]);
        let b = a.map(|v| v * 2.0);
        let diff = b.combine(&a, |x, y| x - y);
        assert!(diff.is_aligned_with(&a));
        assert_eq!(diff.values(), &[1.0, 2.0, 3.0]);
    }
}
