//! Market-structure detection: swing extremes and the break-of-structure
//! trend scan.

pub mod swing;
pub mod trend;

pub use swing::{centered_extreme, SwingBand, SwingMode, SwingPoints};
pub use trend::{scan_trend, StructureTrend, TrendState};

use crate::domain::Bar;

/// Structure labels for a whole bar sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureSeries {
    pub swings: SwingPoints,
    pub trend: Vec<StructureTrend>,
}

/// Run swing detection and the trend scan over `bars`.
pub fn detect(bars: &[Bar], half_window: usize, mode: SwingMode) -> StructureSeries {
    let swings = SwingPoints::compute(bars, half_window);
    let trend = scan_trend(bars, &swings, mode);
    StructureSeries { swings, trend }
}
