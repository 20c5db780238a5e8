//! Daily price bar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of a fund or ETF.
///
/// Bar slices passed to the engine are sorted by date without duplicates;
/// `data::ingest` is the only place that builds them from provider rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Finite positive prices with `low <= open, close <= high`.
    pub fn is_sane(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if !prices.iter().all(|p| p.is_finite() && *p > 0.0) {
            return false;
        }
        self.low <= self.high
            && (self.low..=self.high).contains(&self.open)
            && (self.low..=self.high).contains(&self.close)
    }
}

/// Close prices in bar order.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
