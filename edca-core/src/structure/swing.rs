//! Swing extremes: highest high / lowest low over a centered window.
//!
//! For half-window `w`:
//! - swing_high[i] = max(high[i-w..=i+w])
//! - swing_low[i]  = min(low[i-w..=i+w])
//!
//! The first and last `w` bars have no full window and are NaN / non-swing.
//! A bar is a swing high when its own high equals the window maximum.
//!
//! The window reaches `w` bars into the future, so a swing label at bar i is
//! only knowable at bar i+w. `SwingMode` controls how the trend scan treats
//! that delay.

use crate::domain::Bar;
use serde::{Deserialize, Serialize};

/// How the trend scan consumes swing labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingMode {
    /// Apply a swing at its own bar. Uses up to `w` future bars; suited to
    /// labelling history.
    #[default]
    Centered,
    /// Apply a swing only once its window has closed, `w` bars later.
    /// Trend at bar i depends on bars 0..=i only.
    Confirmed,
}

/// Which extreme to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwingBand {
    High,
    Low,
}

/// Swing extremes and swing flags for a bar sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwingPoints {
    pub half_window: usize,
    pub swing_high: Vec<f64>,
    pub swing_low: Vec<f64>,
    pub is_swing_high: Vec<bool>,
    pub is_swing_low: Vec<bool>,
}

impl SwingPoints {
    /// Compute swing extremes and flags with a centered window of `2w + 1` bars.
    pub fn compute(bars: &[Bar], half_window: usize) -> Self {
        let swing_high = centered_extreme(bars, half_window, SwingBand::High);
        let swing_low = centered_extreme(bars, half_window, SwingBand::Low);

        let is_swing_high = bars
            .iter()
            .zip(&swing_high)
            .map(|(bar, &ext)| bar.high == ext)
            .collect();
        let is_swing_low = bars
            .iter()
            .zip(&swing_low)
            .map(|(bar, &ext)| bar.low == ext)
            .collect();

        Self {
            half_window,
            swing_high,
            swing_low,
            is_swing_high,
            is_swing_low,
        }
    }

    pub fn len(&self) -> usize {
        self.swing_high.len()
    }

    pub fn is_empty(&self) -> bool {
        self.swing_high.is_empty()
    }
}

/// Rolling max (High) or min (Low) over the centered window `[i-w, i+w]`.
///
/// NaN comparisons are false, so a NaN extreme never marks a swing.
pub fn centered_extreme(bars: &[Bar], half_window: usize, band: SwingBand) -> Vec<f64> {
    let n = bars.len();
    let mut result = vec![f64::NAN; n];
    let width = 2 * half_window + 1;

    if n < width {
        return result;
    }

    for i in half_window..(n - half_window) {
        let window = &bars[(i - half_window)..=(i + half_window)];

        match band {
            SwingBand::High => {
                let mut max_val = f64::NEG_INFINITY;
                let mut has_nan = false;
                for bar in window {
                    if bar.high.is_nan() {
                        has_nan = true;
                        break;
                    }
                    if bar.high > max_val {
                        max_val = bar.high;
                    }
                }
                result[i] = if has_nan { f64::NAN } else { max_val };
            }
            SwingBand::Low => {
                let mut min_val = f64::INFINITY;
                let mut has_nan = false;
                for bar in window {
                    if bar.low.is_nan() {
                        has_nan = true;
                        break;
                    }
                    if bar.low < min_val {
                        min_val = bar.low;
                    }
                }
                result[i] = if has_nan { f64::NAN } else { min_val };
            }
        }
    }

    result
}
