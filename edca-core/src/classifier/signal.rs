//! SignalClassifier: maps the latest snapshot to a signal and an amount.

use super::rules::{RuleTable, SignalStatus};
use crate::domain::FundPlan;
use crate::engine::IndicatorSnapshot;
use crate::structure::StructureTrend;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Outcome of classifying one instrument. Created once per plan per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub display_name: String,
    pub symbol: String,
    pub date: NaiveDate,
    pub price: f64,
    pub rsi: Option<f64>,
    pub structure_trend: StructureTrend,
    pub status: SignalStatus,
    pub note: String,
    pub multiplier: f64,
    /// `base_budget * multiplier`, unrounded.
    pub invest_amount: f64,
    pub base_budget: f64,
}

/// Applies a rule table to snapshots.
#[derive(Debug, Clone, Default)]
pub struct SignalClassifier {
    table: RuleTable,
}

impl SignalClassifier {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn classify(&self, snap: &IndicatorSnapshot, plan: &FundPlan) -> SignalResult {
        self.classify_with_rule(snap, plan).1
    }

    /// Classify and also return the index of the rule that fired.
    pub fn classify_with_rule(&self, snap: &IndicatorSnapshot, plan: &FundPlan) -> (usize, SignalResult) {
        let (index, rule) = self.table.first_match(snap);
        let result = SignalResult {
            display_name: plan.display_name.clone(),
            symbol: plan.symbol.clone(),
            date: snap.date,
            price: snap.close,
            rsi: snap.rsi,
            structure_trend: snap.structure_trend,
            status: rule.status,
            note: rule.note.clone(),
            multiplier: rule.multiplier,
            invest_amount: plan.base_budget * rule.multiplier,
            base_budget: plan.base_budget,
        };
        (index, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::RuleSet;

    fn plan() -> FundPlan {
        FundPlan::new("SPY", "S&P 500 (SPY)", 1000.0)
    }

    fn snap(close: f64) -> IndicatorSnapshot {
        IndicatorSnapshot::bare(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(), close)
    }

    #[test]
    fn catch_all_keeps_base_budget() {
        let result = SignalClassifier::default().classify(&snap(100.0), &plan());
        assert_eq!(result.status, SignalStatus::Fair);
        assert_eq!(result.multiplier, 1.0);
        assert_eq!(result.invest_amount, 1000.0);
        assert_eq!(result.base_budget, 1000.0);
    }

    #[test]
    fn invest_amount_is_exact_product() {
        let mut s = snap(90.0);
        s.lower_band = Some(95.0);
        s.structure_trend = StructureTrend::Bullish;

        let odd_plan = FundPlan::new("QQQM", "Nasdaq 100 (QQQM)", 333.33);
        let (index, result) = SignalClassifier::default().classify_with_rule(&s, &odd_plan);
        assert_eq!(index, 0);
        assert_eq!(result.multiplier, 2.0);
        assert_eq!(result.invest_amount, 333.33 * 2.0);
    }

    #[test]
    fn result_carries_snapshot_fields() {
        let mut s = snap(412.5);
        s.rsi = Some(75.2);
        s.structure_trend = StructureTrend::Bullish;
        let classifier = SignalClassifier::new(RuleTable::preset(RuleSet::Sniper).unwrap());
        let result = classifier.classify(&s, &plan());

        assert_eq!(result.symbol, "SPY");
        assert_eq!(result.display_name, "S&P 500 (SPY)");
        assert_eq!(result.price, 412.5);
        assert_eq!(result.rsi, Some(75.2));
        assert_eq!(result.structure_trend, StructureTrend::Bullish);
        assert_eq!(result.status, SignalStatus::Overbought);
        assert_eq!(result.multiplier, 0.6);
        assert_eq!(result.invest_amount, 600.0);
    }
}
