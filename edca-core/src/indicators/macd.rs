//! Moving Average Convergence-Divergence (MACD).
//!
//! Three series (separate Indicator instances):
//! - Line: EMA(close, fast) - EMA(close, slow)
//! - Signal: EMA(line, signal)
//! - Histogram: line - signal
//!
//! All EMAs are first-value seeded, so every series is defined from bar 0.

use super::ema::{ema_of_series, span_alpha};
use super::Indicator;
use crate::domain::{closes, Bar};

/// Which MACD series to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdSeries {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    series: MacdSeries,
    name: String,
}

impl Macd {
    fn with_series(fast: usize, slow: usize, signal: usize, series: MacdSeries) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD spans must be >= 1");
        let label = match series {
            MacdSeries::Line => "line",
            MacdSeries::Signal => "signal",
            MacdSeries::Histogram => "hist",
        };
        Self {
            fast,
            slow,
            signal,
            series,
            name: format!("macd_{label}_{fast}_{slow}_{signal}"),
        }
    }

    pub fn line(fast: usize, slow: usize, signal: usize) -> Self {
        Self::with_series(fast, slow, signal, MacdSeries::Line)
    }

    pub fn signal(fast: usize, slow: usize, signal: usize) -> Self {
        Self::with_series(fast, slow, signal, MacdSeries::Signal)
    }

    pub fn histogram(fast: usize, slow: usize, signal: usize) -> Self {
        Self::with_series(fast, slow, signal, MacdSeries::Histogram)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let (line, signal, hist) = macd_of_closes(&closes(bars), self.fast, self.slow, self.signal);
        match self.series {
            MacdSeries::Line => line,
            MacdSeries::Signal => signal,
            MacdSeries::Histogram => hist,
        }
    }
}

/// Compute (line, signal, histogram) in one pass over the closes.
pub fn macd_of_closes(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let fast_ema = ema_of_series(closes, span_alpha(fast));
    let slow_ema = ema_of_series(closes, span_alpha(slow));

    let line: Vec<f64> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_of_series(&line, span_alpha(signal));
    let hist = line
        .iter()
        .zip(&signal_line)
        .map(|(l, s)| l - s)
        .collect();

    (line, signal_line, hist)
}
