//! Relative Strength Index (RSI).
//!
//! Wilder smoothing of average gains and average losses: a first-value-seeded
//! EMA with alpha = 1/period over the gain and loss series, where the first
//! bar contributes a zero change. Values are defined once `period`
//! observations exist (index period-1 onward).
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Edge cases: avg_loss == 0 → RSI = 100; both averages zero (flat series)
//! → undefined (NaN).

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        let mut gains = vec![0.0; n];
        let mut losses = vec![0.0; n];
        for i in 1..n {
            let change = bars[i].close - bars[i - 1].close;
            if change.is_nan() {
                gains[i] = f64::NAN;
                losses[i] = f64::NAN;
            } else if change > 0.0 {
                gains[i] = change;
            } else {
                losses[i] = -change;
            }
        }
        if bars[0].close.is_nan() {
            return result;
        }

        let alpha = 1.0 / self.period as f64;
        let avg_gain = ema_of_series(&gains, alpha);
        let avg_loss = ema_of_series(&losses, alpha);

        for i in (self.period - 1)..n {
            result[i] = compute_rsi(avg_gain[i], avg_loss[i]);
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        f64::NAN
    } else if avg_loss == 0.0 && avg_gain == 0.0 {
        f64::NAN // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
