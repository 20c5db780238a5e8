//! Indicator engine: computes every indicator and the structure labels for a
//! bar sequence in one pass, then serves per-bar snapshots.
//!
//! The engine owns no state between evaluations. All series are computed
//! once per call to `IndicatorEngine::compute` and stored in an
//! `IndicatorFrame`.

pub mod snapshot;

pub use snapshot::IndicatorSnapshot;

use crate::domain::{closes, Bar};
use crate::indicators::{bands_of_closes, defined, macd_of_closes, Indicator, Rsi, Sma};
use crate::structure::{self, StructureSeries, SwingMode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of bars before a classification is considered valid.
pub const MIN_HISTORY: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid engine parameters: {0}")]
    InvalidParams(String),
}

/// Indicator periods and structure settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub rsi_period: usize,
    pub bollinger_period: usize,
    pub bollinger_width: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub long_sma_period: usize,
    pub swing_window: usize,
    pub swing_mode: SwingMode,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            bollinger_period: 20,
            bollinger_width: 2.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            long_sma_period: MIN_HISTORY,
            swing_window: 5,
            swing_mode: SwingMode::Centered,
        }
    }
}

impl EngineParams {
    /// Bars required before the latest snapshot may be classified.
    ///
    /// Never lower than `MIN_HISTORY`, even with a shorter long SMA.
    pub fn min_history(&self) -> usize {
        self.long_sma_period.max(MIN_HISTORY)
    }

    /// Check that every period is usable.
    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: &str| Err(EngineError::InvalidParams(msg.to_string()));
        if self.rsi_period == 0 {
            return invalid("rsi_period must be >= 1");
        }
        if self.bollinger_period < 2 {
            return invalid("bollinger_period must be >= 2");
        }
        if !self.bollinger_width.is_finite() || self.bollinger_width < 0.0 {
            return invalid("bollinger_width must be a finite, non-negative number");
        }
        if self.macd_fast == 0 || self.macd_slow == 0 || self.macd_signal == 0 {
            return invalid("MACD spans must be >= 1");
        }
        if self.long_sma_period == 0 {
            return invalid("long_sma_period must be >= 1");
        }
        if self.swing_window == 0 {
            return invalid("swing_window must be >= 1");
        }
        Ok(())
    }
}

fn compute_series(indicator: &dyn Indicator, bars: &[Bar]) -> Vec<f64> {
    let series = indicator.compute(bars);
    debug_assert_eq!(
        series.len(),
        bars.len(),
        "indicator '{}' produced {} values for {} bars",
        indicator.name(),
        series.len(),
        bars.len()
    );
    series
}

/// All derived series for one bar sequence.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFrame {
    pub dates: Vec<NaiveDate>,
    pub close: Vec<f64>,
    pub rsi: Vec<f64>,
    pub sma20: Vec<f64>,
    pub std20: Vec<f64>,
    pub lower_band: Vec<f64>,
    pub upper_band: Vec<f64>,
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub macd_hist: Vec<f64>,
    pub sma200: Vec<f64>,
    pub structure: StructureSeries,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Snapshot of every value at bar `index`, or `None` if out of range.
    pub fn snapshot(&self, index: usize) -> Option<IndicatorSnapshot> {
        if index >= self.len() {
            return None;
        }
        let swings = &self.structure.swings;
        Some(IndicatorSnapshot {
            date: self.dates[index],
            close: self.close[index],
            rsi: defined(self.rsi[index]),
            sma20: defined(self.sma20[index]),
            std20: defined(self.std20[index]),
            lower_band: defined(self.lower_band[index]),
            upper_band: defined(self.upper_band[index]),
            macd_line: defined(self.macd_line[index]),
            signal_line: defined(self.signal_line[index]),
            macd_hist: defined(self.macd_hist[index]),
            sma200: defined(self.sma200[index]),
            swing_high: defined(swings.swing_high[index]),
            swing_low: defined(swings.swing_low[index]),
            is_swing_high: swings.is_swing_high[index],
            is_swing_low: swings.is_swing_low[index],
            structure_trend: self.structure.trend[index],
        })
    }

    /// Snapshot of the most recent bar.
    pub fn latest(&self) -> Option<IndicatorSnapshot> {
        self.len().checked_sub(1).and_then(|i| self.snapshot(i))
    }
}

/// Computes an `IndicatorFrame` from bars with fixed parameters.
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    params: EngineParams,
}

impl IndicatorEngine {
    /// Engine for `params`. Zero periods are rejected here rather than
    /// panicking inside the indicator constructors.
    pub fn new(params: EngineParams) -> Result<Self, EngineError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    /// Compute all series. Never panics on empty or constant input.
    pub fn compute(&self, bars: &[Bar]) -> IndicatorFrame {
        let p = &self.params;

        let rsi = compute_series(&Rsi::new(p.rsi_period), bars);
        let close = closes(bars);
        let bands = bands_of_closes(&close, p.bollinger_period, p.bollinger_width);
        let (macd_line, signal_line, macd_hist) =
            macd_of_closes(&close, p.macd_fast, p.macd_slow, p.macd_signal);
        let sma200 = compute_series(&Sma::new(p.long_sma_period), bars);
        let structure = structure::detect(bars, p.swing_window, p.swing_mode);

        IndicatorFrame {
            dates: bars.iter().map(|b| b.date).collect(),
            close,
            rsi,
            sma20: bands.middle,
            std20: bands.std_dev,
            lower_band: bands.lower,
            upper_band: bands.upper,
            macd_line,
            signal_line,
            macd_hist,
            sma200,
            structure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};
    use crate::structure::StructureTrend;

    #[test]
    fn frame_lengths_match_bars() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + (i % 17) as f64).collect();
        let bars = make_bars(&closes);
        let frame = IndicatorEngine::default().compute(&bars);

        assert_eq!(frame.len(), 250);
        for series in [
            &frame.rsi,
            &frame.sma20,
            &frame.std20,
            &frame.lower_band,
            &frame.upper_band,
            &frame.macd_line,
            &frame.signal_line,
            &frame.macd_hist,
            &frame.sma200,
        ] {
            assert_eq!(series.len(), 250);
        }
        assert_eq!(frame.structure.trend.len(), 250);
    }

    #[test]
    fn empty_bars_produce_empty_frame() {
        let frame = IndicatorEngine::default().compute(&[]);
        assert!(frame.is_empty());
        assert!(frame.latest().is_none());
    }

    #[test]
    fn short_history_leaves_sma200_undefined() {
        let bars = make_bars(&[100.0, 101.0, 99.0, 102.0, 103.0]);
        let snap = IndicatorEngine::default().compute(&bars).latest().unwrap();
        assert!(snap.sma200.is_none());
        assert!(snap.sma20.is_none());
        assert!(snap.rsi.is_none());
        assert!(snap.macd_hist.is_some());
    }

    #[test]
    fn flat_series_snapshot() {
        let bars = make_bars(&[100.0; 200]);
        let snap = IndicatorEngine::default().compute(&bars).latest().unwrap();

        assert_eq!(snap.std20, Some(0.0));
        assert_eq!(snap.sma20, Some(100.0));
        assert_eq!(snap.lower_band, Some(100.0));
        assert_eq!(snap.macd_hist, Some(0.0));
        assert_eq!(snap.sma200, Some(100.0));
        assert!(snap.rsi.is_none());
        assert_eq!(snap.structure_trend, StructureTrend::Sideway);
    }

    #[test]
    fn snapshot_matches_series() {
        let closes: Vec<f64> = (0..210).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let frame = IndicatorEngine::default().compute(&make_bars(&closes));
        let snap = frame.snapshot(205).unwrap();
        assert_approx(snap.rsi.unwrap(), frame.rsi[205], 1e-12);
        assert_approx(snap.sma200.unwrap(), frame.sma200[205], 1e-12);
        assert!(frame.snapshot(210).is_none());
    }

    #[test]
    fn default_params() {
        let p = EngineParams::default();
        assert_eq!(p.min_history(), 200);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn invalid_params_rejected() {
        let p = EngineParams {
            swing_window: 0,
            ..EngineParams::default()
        };
        assert!(p.validate().is_err());
        let p = EngineParams {
            bollinger_period: 1,
            ..EngineParams::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn zero_period_engine_is_an_error_not_a_panic() {
        for params in [
            EngineParams {
                rsi_period: 0,
                ..EngineParams::default()
            },
            EngineParams {
                long_sma_period: 0,
                ..EngineParams::default()
            },
            EngineParams {
                bollinger_period: 0,
                ..EngineParams::default()
            },
        ] {
            assert!(matches!(
                IndicatorEngine::new(params),
                Err(EngineError::InvalidParams(_))
            ));
        }
        assert!(IndicatorEngine::new(EngineParams::default()).is_ok());
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let p: EngineParams = serde_json::from_str(r#"{"swing_window": 3, "swing_mode": "confirmed"}"#).unwrap();
        assert_eq!(p.swing_window, 3);
        assert_eq!(p.swing_mode, SwingMode::Confirmed);
        assert_eq!(p.rsi_period, 14);
    }
}
