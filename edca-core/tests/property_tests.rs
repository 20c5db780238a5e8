//! Property tests for indicator and structure invariants.
//!
//! Uses proptest to verify:
//! 1. RSI bounds: every defined RSI value lies in [0, 100]
//! 2. Monotonic closes: a strictly rising series has RSI = 100 wherever defined
//! 3. Trend flips: the structure label only changes on a strict breakout bar
//! 4. Allocation: invest_amount is exactly base_budget × multiplier

use chrono::NaiveDate;
use edca_core::classifier::{RuleSet, RuleTable, SignalClassifier};
use edca_core::domain::{Bar, FundPlan};
use edca_core::engine::IndicatorEngine;
use edca_core::indicators::{Indicator, Rsi};
use edca_core::structure::{self, StructureTrend, SwingMode};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn bars_from(rows: &[(f64, f64, f64)]) -> Vec<Bar> {
    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    rows.iter()
        .enumerate()
        .map(|(i, &(close, up, down))| Bar {
            symbol: "PROP".to_string(),
            date: base_date + chrono::Duration::days(i as i64),
            open: close,
            high: close + up,
            low: close - down,
            close,
            volume: 1000,
        })
        .collect()
}

/// Random walk: (close, high spread, low spread) per bar.
fn arb_walk(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec((-3.0..3.0_f64, 0.0..2.0_f64, 0.0..2.0_f64), min_len..max_len).prop_map(|steps| {
        let mut price = 100.0_f64;
        steps
            .into_iter()
            .map(|(step, up, down)| {
                price = (price + step).max(5.0);
                (price, up, down)
            })
            .collect()
    })
}

fn arb_rising(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.01..5.0_f64, min_len..max_len).prop_map(|steps| {
        steps
            .into_iter()
            .scan(50.0_f64, |price, step| {
                *price += step;
                Some(*price)
            })
            .collect()
    })
}

// ── 1-2. RSI ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_within_bounds(walk in arb_walk(15, 300)) {
        let bars = bars_from(&walk);
        for (i, v) in Rsi::new(14).compute(&bars).into_iter().enumerate() {
            if !v.is_nan() {
                prop_assert!((0.0..=100.0).contains(&v), "rsi[{}] = {} out of range", i, v);
            }
        }
    }

    #[test]
    fn rsi_is_100_for_strictly_rising_closes(closes in arb_rising(15, 250)) {
        let rows: Vec<_> = closes.iter().map(|&c| (c, 0.5, 0.5)).collect();
        let rsi = Rsi::new(14).compute(&bars_from(&rows));
        for (i, v) in rsi.iter().enumerate().skip(13) {
            prop_assert_eq!(*v, 100.0, "rsi[{}] should be 100", i);
        }
    }
}

// ── 3. Trend flips ───────────────────────────────────────────────────

proptest! {
    /// A label change at bar i requires close[i] to break strictly beyond the
    /// swing extreme the scan holds at that bar.
    #[test]
    fn no_spurious_trend_flips(walk in arb_walk(20, 200), w in 1usize..6) {
        let bars = bars_from(&walk);
        for mode in [SwingMode::Centered, SwingMode::Confirmed] {
            let series = structure::detect(&bars, w, mode);
            let swings = &series.swings;

            let mut last_high = bars[0].high;
            let mut last_low = bars[0].low;
            for i in 0..bars.len() {
                let source = match mode {
                    SwingMode::Centered => Some(i),
                    SwingMode::Confirmed => i.checked_sub(w),
                };
                if let Some(j) = source {
                    if swings.is_swing_high[j] {
                        last_high = bars[j].high;
                    }
                    if swings.is_swing_low[j] {
                        last_low = bars[j].low;
                    }
                }

                let prev = if i == 0 { StructureTrend::Sideway } else { series.trend[i - 1] };
                let now = series.trend[i];
                if now != prev {
                    let close = bars[i].close;
                    match now {
                        StructureTrend::Bullish => prop_assert!(close > last_high),
                        StructureTrend::Bearish => prop_assert!(close < last_low && close <= last_high),
                        StructureTrend::Sideway => prop_assert!(false, "trend reverted to Sideway at {}", i),
                    }
                }
            }
        }
    }
}

// ── 4. Allocation ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn invest_amount_is_exact_product(walk in arb_walk(200, 320), budget in 1.0..100_000.0_f64) {
        let bars = bars_from(&walk);
        let snap = IndicatorEngine::default().compute(&bars).latest().unwrap();
        let plan = FundPlan::new("PROP", "Property", budget);

        for set in [RuleSet::Structural, RuleSet::Sniper, RuleSet::Bollinger, RuleSet::Rsi] {
            let classifier = SignalClassifier::new(RuleTable::preset(set).unwrap());
            let result = classifier.classify(&snap, &plan);
            prop_assert_eq!(result.invest_amount, budget * result.multiplier);
            prop_assert_eq!(result.base_budget, budget);
        }
    }
}
