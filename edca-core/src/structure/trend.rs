//! Break-of-structure trend scan.
//!
//! A single left-to-right fold. The accumulator holds the most recent swing
//! high and swing low (seeded with bar 0's high/low) and the current trend
//! (seeded `Sideway`). Per bar:
//! 1. a swing high replaces `last_high`, a swing low replaces `last_low`
//! 2. close > last_high → Bullish; else close < last_low → Bearish;
//!    otherwise the previous trend is kept
//!
//! The label can only change on a bar where one of the strict breakout
//! conditions fires.

use super::swing::{SwingMode, SwingPoints};
use crate::domain::Bar;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Market-structure trend label for a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureTrend {
    Bullish,
    Bearish,
    #[default]
    Sideway,
}

impl fmt::Display for StructureTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StructureTrend::Bullish => "Bullish",
            StructureTrend::Bearish => "Bearish",
            StructureTrend::Sideway => "Sideway",
        };
        f.write_str(label)
    }
}

/// Accumulator of the trend fold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendState {
    pub last_high: f64,
    pub last_low: f64,
    pub trend: StructureTrend,
}

impl TrendState {
    /// Initial state: first bar's extremes, no trend.
    pub fn seed(first: &Bar) -> Self {
        Self {
            last_high: first.high,
            last_low: first.low,
            trend: StructureTrend::Sideway,
        }
    }

    /// Advance the fold by one bar.
    ///
    /// `new_high` / `new_low` carry the swing extremes that become visible on
    /// this bar (if any); `close` is this bar's close.
    pub fn step(&mut self, new_high: Option<f64>, new_low: Option<f64>, close: f64) -> StructureTrend {
        if let Some(high) = new_high {
            self.last_high = high;
        }
        if let Some(low) = new_low {
            self.last_low = low;
        }

        if close > self.last_high {
            self.trend = StructureTrend::Bullish;
        } else if close < self.last_low {
            self.trend = StructureTrend::Bearish;
        }
        self.trend
    }
}

/// Label every bar with its structure trend.
///
/// Returns one label per bar (empty for empty input).
pub fn scan_trend(bars: &[Bar], swings: &SwingPoints, mode: SwingMode) -> Vec<StructureTrend> {
    let Some(first) = bars.first() else {
        return Vec::new();
    };

    let swing_at = |j: usize| -> (Option<f64>, Option<f64>) {
        let high = swings
            .is_swing_high
            .get(j)
            .copied()
            .unwrap_or(false)
            .then(|| bars[j].high);
        let low = swings
            .is_swing_low
            .get(j)
            .copied()
            .unwrap_or(false)
            .then(|| bars[j].low);
        (high, low)
    };

    bars.iter()
        .enumerate()
        .scan(TrendState::seed(first), |state, (i, bar)| {
            let (new_high, new_low) = match mode {
                SwingMode::Centered => swing_at(i),
                SwingMode::Confirmed => i
                    .checked_sub(swings.half_window)
                    .map(swing_at)
                    .unwrap_or((None, None)),
            };
            Some(state.step(new_high, new_low, bar.close))
        })
        .collect()
}
