//! Bollinger Bands over closes.
//!
//! `bands_of_closes` computes all four series in one pass: the middle
//! band (SMA), the sample standard deviation (N-1 divisor) and the bands
//! at `middle ± width * std`. `Bollinger` exposes one of them through the
//! `Indicator` trait.
//!
//! Lookback: period - 1.

use super::sma::sma_of_series;
use super::Indicator;
use crate::domain::{closes, Bar};

/// Which series of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
    StdDev,
}

/// All Bollinger series, each as long as the input.
#[derive(Debug, Clone, PartialEq)]
pub struct BandSeries {
    pub middle: Vec<f64>,
    pub std_dev: Vec<f64>,
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
}

/// Compute every band for `closes`. A window containing NaN is NaN in all
/// four series.
pub fn bands_of_closes(closes: &[f64], period: usize, width: f64) -> BandSeries {
    let middle = sma_of_series(closes, period);
    let std_dev: Vec<f64> = middle
        .iter()
        .enumerate()
        .map(|(i, &mean)| {
            if mean.is_nan() || period < 2 {
                return f64::NAN;
            }
            let window = &closes[i + 1 - period..=i];
            let sum_sq: f64 = window.iter().map(|c| (c - mean).powi(2)).sum();
            (sum_sq / (period - 1) as f64).sqrt()
        })
        .collect();
    let upper = middle.iter().zip(&std_dev).map(|(m, s)| m + width * s).collect();
    let lower = middle.iter().zip(&std_dev).map(|(m, s)| m - width * s).collect();

    BandSeries {
        middle,
        std_dev,
        upper,
        lower,
    }
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    width: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    fn with_band(period: usize, width: f64, band: BollingerBand) -> Self {
        assert!(period >= 2, "Bollinger period must be >= 2 for a sample stddev");
        let label = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Middle => "middle",
            BollingerBand::Lower => "lower",
            BollingerBand::StdDev => "std",
        };
        Self {
            period,
            width,
            band,
            name: format!("bb_{label}_{period}x{width}"),
        }
    }

    pub fn upper(period: usize, width: f64) -> Self {
        Self::with_band(period, width, BollingerBand::Upper)
    }

    pub fn middle(period: usize, width: f64) -> Self {
        Self::with_band(period, width, BollingerBand::Middle)
    }

    pub fn lower(period: usize, width: f64) -> Self {
        Self::with_band(period, width, BollingerBand::Lower)
    }

    pub fn std_dev(period: usize) -> Self {
        Self::with_band(period, 0.0, BollingerBand::StdDev)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let bands = bands_of_closes(&closes(bars), self.period, self.width);
        match self.band {
            BollingerBand::Upper => bands.upper,
            BollingerBand::Middle => bands.middle,
            BollingerBand::Lower => bands.lower,
            BollingerBand::StdDev => bands.std_dev,
        }
    }
}
