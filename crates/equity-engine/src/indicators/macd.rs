//! MACD with rolling-mean smoothing

use crate::series::Series;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub ema_fast: Series,
    pub ema_slow: Series,
    pub macd: Series,
    pub signal_line: Series,
    pub smoothed_macd: Series,
    pub smoothed_signal: Series,
}

/// Spans for [`macd`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdSpans {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub smoothing: usize,
}

/// MACD = EMA(fast) - EMA(slow); signal line = EMA(signal) of MACD.
///
/// Both lines are then smoothed with a simple rolling mean, and the crossing
/// rules compare the smoothed pair.
pub fn macd(close: &Series, spans: MacdSpans) -> MacdLines {
    let ema_fast = close.ewm_mean(spans.fast);
    let ema_slow = close.ewm_mean(spans.slow);
    let macd = ema_fast.combine(&ema_slow, |fast, slow| fast - slow);
    let signal_line = macd.ewm_mean(spans.signal);
    let smoothed_macd = macd.rolling_mean(spans.smoothing);
    let smoothed_signal = signal_line.rolling_mean(spans.smoothing);

    MacdLines {
        ema_fast,
        ema_slow,
        macd,
        signal_line,
        smoothed_macd,
        smoothed_signal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;

    const SPANS: MacdSpans = MacdSpans {
        fast: 12,
        slow: 26,
        signal: 9,
        smoothing: 15,
    };

    fn close(values: Vec<f64>) -> Series {
        let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let index: Arc<[NaiveDate]> = (0..values.len() as i64)
            .map(|d| start + chrono::Duration::days(d))
            .collect();
        Series::new(index, values).unwrap()
    }

    #[test]
    fn test_macd_is_fast_minus_slow() {
        let lines = macd(&close((0..60).map(|i| 50.0 + f64::from(i) * 0.5).collect()), SPANS);
        for i in 0..60 {
            let expected = lines.ema_fast.values()[i] - lines.ema_slow.values()[i];
            assert_eq!(lines.macd.values()[i], expected);
        }
    }

    #[test]
    fn test_uptrend_has_positive_macd() {
        let lines = macd(&close((0..60).map(|i| 50.0 + f64::from(i)).collect()), SPANS);
        assert!(lines.macd.values()[1..].iter().all(|v| *v > 0.0));
    }
}
