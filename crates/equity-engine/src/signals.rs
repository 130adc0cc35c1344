//! Buy/sell signal generation
//!
//! Three component conditions are evaluated per session:
//!
//! | condition  | buy                                   | sell                                  |
//! |------------|---------------------------------------|---------------------------------------|
//! | MA         | close > moving average                | close < moving average                |
//! | stochastic | smoothed %D crosses above 30          | smoothed %D crosses below 30          |
//! | MACD       | smoothed MACD crosses above signal    | smoothed MACD crosses below signal    |
//!
//! A final `Buy_Signal` fires when each buy condition held at least once in
//! the trailing confirmation window (current day included). The conditions do
//! not need to line up on the same session. `Sell_Signal` is symmetric.
//!
//! Choppy prices can confirm both directions inside one window. Such days are
//! treated as undecided: both flags are cleared, so a day never carries a buy
//! and a sell at once.

use crate::indicators::{IndicatorColumns, IndicatorSeries};
use crate::recommendation::TechnicalCall;
use crate::series::Series;
use tracing::debug;

/// Trailing sessions that a component condition stays "confirmed"
pub const CONFIRMATION_WINDOW: usize = 10;

/// Smoothed %D level whose crossings drive the stochastic condition
pub const STOCHASTIC_TRIGGER: f64 = 30.0;

/// Per-day boolean flags, aligned with the price dates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalColumns {
    pub buy_ma: Vec<bool>,
    pub buy_stochastic: Vec<bool>,
    pub buy_macd: Vec<bool>,
    pub sell_ma: Vec<bool>,
    pub sell_stochastic: Vec<bool>,
    pub sell_macd: Vec<bool>,
    pub buy_signal: Vec<bool>,
    pub sell_signal: Vec<bool>,
}

impl SignalColumns {
    /// Number of flagged sessions
    pub fn len(&self) -> usize {
        self.buy_signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buy_signal.is_empty()
    }

    /// Count of (buy, sell) days among the last `lookback` sessions
    pub fn tally(&self, lookback: usize) -> (usize, usize) {
        let start = self.len().saturating_sub(lookback);
        let count = |flags: &[bool]| flags[start..].iter().filter(|f| **f).count();
        (count(&self.buy_signal), count(&self.sell_signal))
    }
}

/// Turns indicator columns into buy/sell flags
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    window: usize,
    stochastic_trigger: f64,
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self {
            window: CONFIRMATION_WINDOW,
            stochastic_trigger: STOCHASTIC_TRIGGER,
        }
    }
}

impl SignalGenerator {
    /// Generator confirming over `window` sessions (at least 1)
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            ..Self::default()
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Attach signal columns
    ///
    /// Series without indicator columns (short history) come back unchanged.
    pub fn generate(&self, series: IndicatorSeries) -> IndicatorSeries {
        let Some(columns) = series.indicators() else {
            debug!(sessions = series.len(), "No indicators, skipping signal generation");
            return series;
        };
        let signals = self.evaluate(series.close(), columns);
        series.with_signals(signals)
    }

    fn evaluate(&self, close: &Series, columns: &IndicatorColumns) -> SignalColumns {
        let close = close.values();
        let ma = columns.moving_average.values();
        let d = columns.smoothed_d.values();
        let macd = columns.smoothed_macd.values();
        let signal = columns.smoothed_signal.values();
        let trigger = self.stochastic_trigger;

        let buy_ma: Vec<bool> = close.iter().zip(ma).map(|(c, m)| c > m).collect();
        let sell_ma: Vec<bool> = close.iter().zip(ma).map(|(c, m)| c < m).collect();

        let buy_stochastic = crossings(d.len(), |i, prev| d[i] > trigger && d[prev] <= trigger);
        let sell_stochastic = crossings(d.len(), |i, prev| d[i] < trigger && d[prev] >= trigger);

        let buy_macd = crossings(macd.len(), |i, prev| macd[i] > signal[i] && macd[prev] <= signal[prev]);
        let sell_macd = crossings(macd.len(), |i, prev| macd[i] < signal[i] && macd[prev] >= signal[prev]);

        let (buy_signal, sell_signal) = drop_conflicts(
            confirm(&[&buy_ma, &buy_stochastic, &buy_macd], self.window),
            confirm(&[&sell_ma, &sell_stochastic, &sell_macd], self.window),
        );

        SignalColumns {
            buy_ma,
            buy_stochastic,
            buy_macd,
            sell_ma,
            sell_stochastic,
            sell_macd,
            buy_signal,
            sell_signal,
        }
    }
}

/// Evaluate a crossing rule against the previous session; the first day has none
fn crossings(len: usize, crossed: impl Fn(usize, usize) -> bool) -> Vec<bool> {
    (0..len).map(|i| i > 0 && crossed(i, i - 1)).collect()
}

/// True when each condition held somewhere in the trailing window.
/// Days before a full window exists are false.
fn confirm(conditions: &[&[bool]], window: usize) -> Vec<bool> {
    let len = conditions.first().map_or(0, |c| c.len());
    (0..len)
        .map(|i| {
            i + 1 >= window
                && conditions
                    .iter()
                    .all(|flags| flags[i + 1 - window..=i].iter().any(|f| *f))
        })
        .collect()
}

/// Clear both flags on days where buy and sell confirm together
fn drop_conflicts(mut buy: Vec<bool>, mut sell: Vec<bool>) -> (Vec<bool>, Vec<bool>) {
    for (b, s) in buy.iter_mut().zip(sell.iter_mut()) {
        if *b && *s {
            *b = false;
            *s = false;
        }
    }
    (buy, sell)
}

/// Run the default generator
pub fn generate_signals(series: IndicatorSeries) -> IndicatorSeries {
    SignalGenerator::default().generate(series)
}

/// Tally buy vs sell days over the most recent `lookback` sessions
///
/// More buy days gives `Buy`, more sell days gives `Sell`; a tie, no signals,
/// or a series without signal columns gives `Hold`.
pub fn technical_call(series: &IndicatorSeries, lookback: usize) -> TechnicalCall {
    let Some(signals) = series.signals() else {
        return TechnicalCall::Hold;
    };
    let (buys, sells) = signals.tally(lookback);
    if buys > sells {
        TechnicalCall::Buy
    } else if sells > buys {
        TechnicalCall::Sell
    } else {
        TechnicalCall::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{PricePoint, PriceSeries};
    use chrono::NaiveDate;

    fn flags(pattern: &str) -> Vec<bool> {
        pattern.chars().map(|c| c == '1').collect()
    }

    fn prices(len: usize) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        PriceSeries::new(
            (0..len)
                .map(|i| PricePoint::new(start + chrono::Duration::days(i as i64), 1.0, 1.0, 1.0, 1.0))
                .collect(),
        )
    }

    fn with_signals(buy: &str, sell: &str) -> IndicatorSeries {
        let buy_signal = flags(buy);
        let sell_signal = flags(sell);
        let columns = SignalColumns {
            buy_signal,
            sell_signal,
            ..SignalColumns::default()
        };
        IndicatorSeries::from_parts(prices(buy.len()), None, Some(columns))
    }

    #[test]
    fn test_confirm_requires_each_condition_in_window() {
        // ma on day 0, stochastic on day 2, macd on day 4: all inside a 5-day window at day 4
        let ma = flags("10000000");
        let stoch = flags("00100000");
        let macd = flags("00001000");
        let confirmed = confirm(&[&ma, &stoch, &macd], 5);
        assert_eq!(confirmed, flags("00001000"));
    }

    #[test]
    fn test_confirm_false_before_full_window() {
        let always = flags("1111111111");
        let confirmed = confirm(&[&always, &always, &always], 10);
        assert_eq!(confirmed, flags("0000000001"));
    }

    #[test]
    fn test_conflicting_days_carry_no_signal() {
        let (buy, sell) = drop_conflicts(flags("1101100"), flags("0111010"));
        assert_eq!(buy, flags("1000100"));
        assert_eq!(sell, flags("0010010"));
    }

    #[test]
    fn test_generate_resolves_simultaneous_confirmation() {
        // every component fires both ways inside the window
        let ma_up = flags("1010101010");
        let ma_down = flags("0101010101");
        let cross = flags("0000110000");
        let buy = confirm(&[&ma_up, &cross, &cross], 10);
        let sell = confirm(&[&ma_down, &cross, &cross], 10);
        assert!(buy[9] && sell[9]);

        let (buy, sell) = drop_conflicts(buy, sell);
        assert!(!buy[9] && !sell[9]);
    }

    #[test]
    fn test_crossings_skip_first_day() {
        let d = [40.0, 20.0, 35.0, 35.0];
        let up = crossings(d.len(), |i, prev| d[i] > 30.0 && d[prev] <= 30.0);
        assert_eq!(up, vec![false, false, true, false]);
    }

    #[test]
    fn test_technical_call_tally() {
        let series = with_signals("0000000000011", "0000000000000");
        assert_eq!(technical_call(&series, 10), TechnicalCall::Buy);

        let series = with_signals("1111111111000", "0000000000110");
        // only the last 10 days count: 7 buys vs 2 sells
        assert_eq!(technical_call(&series, 10), TechnicalCall::Buy);

        let series = with_signals("0000000001000", "0000000000100");
        assert_eq!(technical_call(&series, 10), TechnicalCall::Hold);

        let series = with_signals("0000000000000", "0000000000011");
        assert_eq!(technical_call(&series, 10), TechnicalCall::Sell);
    }

    #[test]
    fn test_technical_call_without_signals_holds() {
        assert_eq!(technical_call(&IndicatorSeries::empty(), 10), TechnicalCall::Hold);
    }

    #[test]
    fn test_generate_without_indicators_is_identity() {
        let series = IndicatorSeries::from_prices(prices(12));
        let generated = generate_signals(series.clone());
        assert_eq!(generated, series);
    }
}
