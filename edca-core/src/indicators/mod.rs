//! Concrete indicator implementations.
//!
//! All indicators implement the `Indicator` trait. The engine in
//! `crate::engine` computes them once per evaluation into an
//! `IndicatorFrame` and reads the latest bar from there.
//!
//! Multi-series indicators (Bollinger, MACD) are exposed as separate named
//! instances per series, keeping the single-series `Indicator` trait
//! unchanged. Composite callers use the `*_of_*` helpers to avoid
//! recomputing shared intermediates.

pub mod bollinger;
pub mod ema;
pub mod indicator;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{bands_of_closes, BandSeries, Bollinger, BollingerBand};
pub use ema::{ema_of_series, span_alpha, Ema};
pub use indicator::Indicator;
pub use macd::{macd_of_closes, Macd, MacdSeries};
pub use rsi::Rsi;
pub use sma::{sma_of_series, Sma};

/// Convert a NaN-marked series value into an `Option`.
pub fn defined(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                symbol: "TEST".to_string(),
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
