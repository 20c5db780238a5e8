//! The `Indicator` seam shared by RSI, SMA, EMA, Bollinger and MACD.

use crate::domain::Bar;

/// A series derived from closes, one value per bar.
///
/// Values before `lookback()` are NaN and surface as `None` in snapshots.
/// The value at bar t reads bars `0..=t` only; `tests/lookahead_test.rs`
/// checks every implementation against a truncated history. Centered swing
/// extremes read later bars and so live in `structure`, outside this trait.
pub trait Indicator: Send + Sync {
    /// Short identifier such as `rsi_14`.
    fn name(&self) -> &str;

    /// Index of the first defined value.
    fn lookback(&self) -> usize;

    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}
