//! Per-plan evaluation: fetch → ingest → indicators → structure → classify.
//!
//! One plan's failure never affects another: every outcome is a
//! `Result<Evaluation, EvalError>` and the batch runner aggregates them.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use edca_core::classifier::{SignalClassifier, SignalResult};
use edca_core::data::{ingest, DataError, DataProvider, DataSource};
use edca_core::domain::FundPlan;
use edca_core::engine::{IndicatorEngine, IndicatorSnapshot};

/// Why a plan produced no signal.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("{symbol}: insufficient history ({bars} bars, need {required})")]
    InsufficientHistory {
        symbol: String,
        bars: usize,
        required: usize,
    },
    #[error("{symbol}: a {lookback_days}-day window before the evaluation date is out of range")]
    WindowOutOfRange { symbol: String, lookback_days: u32 },
    #[error("provider failure: {0}")]
    Provider(#[from] DataError),
}

/// Fetch window `[as_of - lookback_days, as_of]`, or `None` when the start
/// falls outside the representable calendar.
pub fn fetch_window(as_of: NaiveDate, lookback_days: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = as_of.checked_sub_days(Days::new(u64::from(lookback_days)))?;
    Some((start, as_of))
}

/// A successful evaluation and the context it came from.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub result: SignalResult,
    /// Position of the rule that fired in the active table.
    pub rule_index: usize,
    pub snapshot: IndicatorSnapshot,
    pub source: DataSource,
    pub bar_count: usize,
}

/// Evaluates plans with a fixed engine and classifier.
#[derive(Debug, Clone)]
pub struct Evaluator {
    engine: IndicatorEngine,
    classifier: SignalClassifier,
    lookback_days: u32,
}

impl Evaluator {
    pub fn new(engine: IndicatorEngine, classifier: SignalClassifier, lookback_days: u32) -> Self {
        Self {
            engine,
            classifier,
            lookback_days,
        }
    }

    /// Evaluate one plan against bars up to and including `as_of`.
    pub fn evaluate(
        &self,
        provider: &dyn DataProvider,
        plan: &FundPlan,
        as_of: NaiveDate,
    ) -> Result<Evaluation, EvalError> {
        let (start, end) = fetch_window(as_of, self.lookback_days).ok_or_else(|| EvalError::WindowOutOfRange {
            symbol: plan.symbol.clone(),
            lookback_days: self.lookback_days,
        })?;
        let fetched = provider.fetch(&plan.symbol, start, end)?;
        let source = fetched.source;
        let mut bars = ingest(&plan.symbol, fetched.bars)?;
        // Providers may return rows past the window end (intraday bar)
        bars.retain(|b| b.date <= as_of);

        let required = self.engine.params().min_history();
        if bars.len() < required {
            return Err(EvalError::InsufficientHistory {
                symbol: plan.symbol.clone(),
                bars: bars.len(),
                required,
            });
        }

        let frame = self.engine.compute(&bars);
        let snapshot = frame.latest().ok_or_else(|| EvalError::InsufficientHistory {
            symbol: plan.symbol.clone(),
            bars: 0,
            required,
        })?;
        let (rule_index, result) = self.classifier.classify_with_rule(&snapshot, plan);
        debug!(
            symbol = %plan.symbol,
            bars = bars.len(),
            rule = rule_index,
            status = %result.status,
            "classified"
        );

        Ok(Evaluation {
            result,
            rule_index,
            snapshot,
            source,
            bar_count: bars.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edca_core::classifier::SignalStatus;
    use edca_core::data::{FetchResult, RawBar, SyntheticProvider};
    use edca_core::engine::EngineParams;

    /// Provider returning a fixed number of flat bars ending on `end`.
    struct FlatProvider {
        count: usize,
    }

    impl DataProvider for FlatProvider {
        fn name(&self) -> &str {
            "flat"
        }

        fn fetch(&self, symbol: &str, _start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
            let bars = (0..self.count)
                .map(|i| {
                    let date = end - chrono::Duration::days((self.count - 1 - i) as i64);
                    RawBar::complete(date, 100.0, 100.0, 100.0, 100.0, 10)
                })
                .collect();
            Ok(FetchResult {
                symbol: symbol.to_string(),
                bars,
                source: DataSource::Synthetic,
            })
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn evaluator() -> Evaluator {
        Evaluator::new(IndicatorEngine::default(), SignalClassifier::default(), 400)
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
    }

    #[test]
    fn flat_history_is_fair() {
        let plan = FundPlan::new("FLAT", "Flat", 1000.0);
        let eval = evaluator()
            .evaluate(&FlatProvider { count: 200 }, &plan, as_of())
            .unwrap();
        assert_eq!(eval.result.status, SignalStatus::Fair);
        assert_eq!(eval.result.invest_amount, 1000.0);
        assert_eq!(eval.result.date, as_of());
        assert_eq!(eval.rule_index, 5);
        assert_eq!(eval.bar_count, 200);
    }

    #[test]
    fn short_history_is_an_error() {
        let plan = FundPlan::new("FLAT", "Flat", 1000.0);
        let err = evaluator()
            .evaluate(&FlatProvider { count: 199 }, &plan, as_of())
            .unwrap_err();
        match err {
            EvalError::InsufficientHistory { symbol, bars, required } => {
                assert_eq!(symbol, "FLAT");
                assert_eq!(bars, 199);
                assert_eq!(required, 200);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn longer_sma_raises_requirement() {
        let engine = IndicatorEngine::new(EngineParams {
            long_sma_period: 250,
            ..EngineParams::default()
        })
        .unwrap();
        let evaluator = Evaluator::new(engine, SignalClassifier::default(), 400);
        let err = evaluator
            .evaluate(&FlatProvider { count: 220 }, &FundPlan::new("X", "X", 1.0), as_of())
            .unwrap_err();
        assert!(matches!(err, EvalError::InsufficientHistory { required: 250, .. }));
    }

    #[test]
    fn window_spans_lookback_days() {
        let (start, end) = fetch_window(as_of(), 365).unwrap();
        assert_eq!(end, as_of());
        assert_eq!((end - start).num_days(), 365);
        assert!(fetch_window(as_of(), u32::MAX).is_none());
    }

    #[test]
    fn unrepresentable_window_is_an_error_not_a_panic() {
        let evaluator = Evaluator::new(IndicatorEngine::default(), SignalClassifier::default(), u32::MAX);
        let err = evaluator
            .evaluate(&FlatProvider { count: 200 }, &FundPlan::new("SPY", "SPY", 1.0), as_of())
            .unwrap_err();
        assert!(matches!(err, EvalError::WindowOutOfRange { lookback_days: u32::MAX, .. }));
    }

    #[test]
    fn synthetic_year_evaluates() {
        let plan = FundPlan::new("SPY", "S&P 500 (SPY)", 1000.0);
        let eval = evaluator()
            .evaluate(&SyntheticProvider::default(), &plan, as_of())
            .unwrap();
        assert_eq!(eval.source, DataSource::Synthetic);
        assert!(eval.result.date <= as_of());
        assert_eq!(eval.result.invest_amount, 1000.0 * eval.result.multiplier);
    }
}
