//! Properties of report rendering.

use chrono::NaiveDate;
use edca_core::classifier::{RuleSet, SignalResult, SignalStatus};
use edca_core::structure::StructureTrend;
use edca_runner::{format_report, format_thousands, ReportStyle, RunReport};
use proptest::prelude::*;

fn result(symbol: &str, base: f64, multiplier: f64) -> SignalResult {
    SignalResult {
        display_name: symbol.to_string(),
        symbol: symbol.to_string(),
        date: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
        price: 100.0,
        rsi: Some(45.0),
        structure_trend: StructureTrend::Sideway,
        status: SignalStatus::Fair,
        note: String::new(),
        multiplier,
        invest_amount: base * multiplier,
        base_budget: base,
    }
}

proptest! {
    #[test]
    fn thousands_round_trip(value in 0.0f64..1e12) {
        let text = format_thousands(value);
        let digits: String = text.chars().filter(|c| *c != ',').collect();
        prop_assert!((digits.parse::<f64>().unwrap() - value).abs() <= 0.5);
        for group in text.split(',').skip(1) {
            prop_assert_eq!(group.len(), 3);
        }
    }

    #[test]
    fn one_block_per_result(budgets in prop::collection::vec(1.0f64..100_000.0, 1..8)) {
        let results: Vec<SignalResult> = budgets
            .iter()
            .enumerate()
            .map(|(i, b)| result(&format!("F{i}"), *b, 1.5))
            .collect();
        let report = RunReport {
            run_id: "p".into(),
            as_of: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            rule_set: RuleSet::Structural,
            currency: "THB".into(),
            results,
            failures: vec![],
        };
        let msg = format_report(&report, &ReportStyle::default());
        prop_assert_eq!(msg.matches("📌 ").count(), budgets.len());
        prop_assert_eq!(msg.matches("💰 Invest: ").count(), budgets.len());
        let total_line = format!("💸 Total Today: {} THB", format_thousands(report.total_invest()));
        prop_assert!(msg.ends_with(&total_line));
    }
}
