//! Per-bar view of every derived value.

use crate::structure::StructureTrend;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// All indicator and structure values at one bar.
///
/// Values still in warmup (or undefined, such as RSI on a flat series) are
/// `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub rsi: Option<f64>,
    pub sma20: Option<f64>,
    pub std20: Option<f64>,
    pub lower_band: Option<f64>,
    pub upper_band: Option<f64>,
    pub macd_line: Option<f64>,
    pub signal_line: Option<f64>,
    pub macd_hist: Option<f64>,
    pub sma200: Option<f64>,
    pub swing_high: Option<f64>,
    pub swing_low: Option<f64>,
    pub is_swing_high: bool,
    pub is_swing_low: bool,
    pub structure_trend: StructureTrend,
}

impl IndicatorSnapshot {
    /// A snapshot at `close` with nothing else defined. Callers fill in the
    /// fields they need; used to build synthetic inputs for rule tables.
    pub fn bare(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            close,
            rsi: None,
            sma20: None,
            std20: None,
            lower_band: None,
            upper_band: None,
            macd_line: None,
            signal_line: None,
            macd_hist: None,
            sma200: None,
            swing_high: None,
            swing_low: None,
            is_swing_high: false,
            is_swing_low: false,
            structure_trend: StructureTrend::Sideway,
        }
    }
}
