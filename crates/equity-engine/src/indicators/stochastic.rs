//! Smoothed stochastic oscillator

use crate::series::Series;

/// Substituted for `high - low` when the look-back range is flat.
///
/// A flat range with the close on the low yields %K = 0. A close outside a
/// flat range (inconsistent provider data) yields a very large magnitude; the
/// value is kept rather than clamped so the anomaly stays visible downstream.
pub const ZERO_RANGE_DENOMINATOR: f64 = 1e-10;

/// Oscillator lines derived from one close/high/low triple
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticLines {
    /// %K after its short smoothing pass
    pub percent_k: Series,
    pub percent_d: Series,
    /// Long rolling mean of %D, the line the crossing rules watch
    pub smoothed_d: Series,
}

/// Window lengths for [`stochastic`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StochasticWindows {
    pub range: usize,
    pub k_smoothing: usize,
    pub d_smoothing: usize,
    pub d_long: usize,
}

/// Compute %K, %D and smoothed %D
///
/// `close`, `high` and `low` must share one date index.
pub fn stochastic(close: &Series, high: &Series, low: &Series, windows: StochasticWindows) -> StochasticLines {
    let highest = high.rolling_max(windows.range);
    let lowest = low.rolling_min(windows.range);

    let range = highest.combine(&lowest, |h, l| {
        let width = h - l;
        if width == 0.0 { ZERO_RANGE_DENOMINATOR } else { width }
    });
    let raw_k = close
        .combine(&lowest, |c, l| (c - l) * 100.0)
        .combine(&range, |numerator, width| numerator / width);

    let percent_k = raw_k.rolling_mean(windows.k_smoothing);
    let percent_d = percent_k.rolling_mean(windows.d_smoothing);
    let smoothed_d = percent_d.rolling_mean(windows.d_long);

    StochasticLines {
        percent_k,
        percent_d,
        smoothed_d,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;

    const WINDOWS: StochasticWindows = StochasticWindows {
        range: 14,
        k_smoothing: 3,
        d_smoothing: 3,
        d_long: 30,
    };

    fn series(index: &Arc<[NaiveDate]>, values: Vec<f64>) -> Series {
        Series::new(Arc::clone(index), values).unwrap()
    }

    fn index(len: usize) -> Arc<[NaiveDate]> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        (0..len as i64).map(|d| start + chrono::Duration::days(d)).collect()
    }

    #[test]
    fn test_close_at_high_reads_one_hundred() {
        let idx = index(20);
        let close: Vec<f64> = (0..20).map(|i| 100.0 + f64::from(i)).collect();
        let lines = stochastic(
            &series(&idx, close.clone()),
            &series(&idx, close.clone()),
            &series(&idx, close.iter().map(|c| c - 1.0).collect()),
            WINDOWS,
        );

        let last = *lines.percent_k.values().last().unwrap();
        assert!((last - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_range_does_not_divide_by_zero() {
        let idx = index(40);
        let flat = series(&idx, vec![50.0; 40]);
        let lines = stochastic(&flat, &flat, &flat, WINDOWS);

        assert!(lines.percent_k.values().iter().all(|v| *v == 0.0));
        assert!(lines.smoothed_d.values().iter().all(|v| v.is_finite()));
    }
}
