//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1]
//! Seed: EMA[0] = x[0] (no SMA warmup, no minimum-period gate).
//! Span form: alpha = 2 / (span + 1).
//! Lookback: 0.

use super::Indicator;
use crate::domain::{closes, Bar};

#[derive(Debug, Clone)]
pub struct Ema {
    span: usize,
    name: String,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        assert!(span >= 1, "EMA span must be >= 1");
        Self {
            span,
            name: format!("ema_{span}"),
        }
    }

    pub fn alpha(&self) -> f64 {
        span_alpha(self.span)
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        ema_of_series(&closes(bars), self.alpha())
    }
}

/// Smoothing factor for an EMA expressed as a span.
pub fn span_alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Compute a first-value-seeded EMA over an arbitrary series.
///
/// Leading NaNs stay NaN and the seed is the first finite value. A NaN after
/// the seed taints every later value. Used by MACD (EMA of EMA difference)
/// and by RSI's Wilder smoothing (alpha = 1/period).
pub fn ema_of_series(values: &[f64], alpha: f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return result;
    };

    let mut prev = values[start];
    result[start] = prev;

    for i in (start + 1)..n {
        if values[i].is_nan() {
            // NaN propagates: once we see NaN, subsequent values are tainted
            return result;
        }
        // Incremental form keeps a constant series exactly constant
        let ema = prev + alpha * (values[i] - prev);
        result[i] = ema;
        prev = ema;
    }

    result
}
