//! Batch runner: evaluates every plan of an `AppConfig` and aggregates the
//! outcomes into a `RunReport`.
//!
//! Plans are independent. With `parallel = true` they are evaluated on the
//! global rayon pool; results keep plan order either way.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use edca_core::classifier::{RuleSet, SignalClassifier, SignalResult};
use edca_core::data::{
    CircuitBreaker, CsvProvider, DataError, DataProvider, SyntheticProvider, YahooProvider,
};
use edca_core::domain::FundPlan;
use edca_core::engine::IndicatorEngine;

use crate::config::{AppConfig, ConfigError, ProviderConfig, ProviderKind};
use crate::evaluate::{EvalError, Evaluation, Evaluator};
use crate::notify::{Delivery, NotificationGateway, NotifyError};
use crate::report::{format_report, ReportStyle};

/// Category of a failed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InsufficientHistory,
    InvalidWindow,
    Provider,
}

/// Typed record of a plan that produced no signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFailure {
    pub symbol: String,
    pub display_name: String,
    pub kind: FailureKind,
    pub message: String,
}

impl PlanFailure {
    fn new(plan: &FundPlan, err: &EvalError) -> Self {
        let kind = match err {
            EvalError::InsufficientHistory { .. } => FailureKind::InsufficientHistory,
            EvalError::WindowOutOfRange { .. } => FailureKind::InvalidWindow,
            EvalError::Provider(_) => FailureKind::Provider,
        };
        Self {
            symbol: plan.symbol.clone(),
            display_name: plan.display_name.clone(),
            kind,
            message: err.to_string(),
        }
    }
}

/// Outcome of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub as_of: NaiveDate,
    pub rule_set: RuleSet,
    pub currency: String,
    /// One entry per successfully evaluated plan, in plan order.
    pub results: Vec<SignalResult>,
    pub failures: Vec<PlanFailure>,
}

impl RunReport {
    /// Sum of unrounded invest amounts.
    pub fn total_invest(&self) -> f64 {
        self.results.iter().map(|r| r.invest_amount).sum()
    }

    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }
}

/// Data provider a `ProviderConfig` describes.
pub fn provider_for(config: &ProviderConfig) -> Result<Box<dyn DataProvider>, DataError> {
    let provider: Box<dyn DataProvider> = match config.kind {
        ProviderKind::Yahoo => Box::new(YahooProvider::with_timeout(
            Arc::new(CircuitBreaker::default_provider()),
            Duration::from_secs(config.timeout_secs),
        )?),
        ProviderKind::Csv => Box::new(CsvProvider::new(&config.csv_dir)),
        ProviderKind::Synthetic => Box::new(SyntheticProvider::default()),
    };
    Ok(provider)
}

/// Build the evaluator an `AppConfig` describes.
pub fn evaluator_for(config: &AppConfig) -> Result<Evaluator, ConfigError> {
    let classifier = SignalClassifier::new(config.rule_table()?);
    Ok(Evaluator::new(
        IndicatorEngine::new(config.engine.clone())?,
        classifier,
        config.lookback_days,
    ))
}

/// Evaluate every plan. Only configuration problems are fatal; per-plan
/// failures are recorded in the report.
pub fn run_batch(
    config: &AppConfig,
    provider: &dyn DataProvider,
    as_of: NaiveDate,
) -> Result<RunReport, ConfigError> {
    let evaluator = evaluator_for(config)?;
    let run_id = config.run_id(as_of);
    info!(
        run_id = %run_id,
        %as_of,
        plans = config.plans.len(),
        provider = provider.name(),
        rule_set = %config.rule_set,
        "starting run"
    );

    let evaluate = |plan: &FundPlan| evaluator.evaluate(provider, plan, as_of);
    let outcomes: Vec<Result<Evaluation, EvalError>> = if config.parallel {
        config.plans.par_iter().map(evaluate).collect()
    } else {
        config.plans.iter().map(evaluate).collect()
    };

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for (plan, outcome) in config.plans.iter().zip(outcomes) {
        match outcome {
            Ok(eval) => {
                info!(
                    symbol = %plan.symbol,
                    status = %eval.result.status,
                    multiplier = eval.result.multiplier,
                    invest = eval.result.invest_amount,
                    "signal"
                );
                results.push(eval.result);
            }
            Err(err) => {
                warn!(symbol = %plan.symbol, error = %err, "plan skipped");
                failures.push(PlanFailure::new(plan, &err));
            }
        }
    }

    info!(
        run_id = %run_id,
        succeeded = results.len(),
        failed = failures.len(),
        "run complete"
    );

    Ok(RunReport {
        run_id,
        as_of,
        rule_set: config.rule_set,
        currency: config.currency.clone(),
        results,
        failures,
    })
}

/// What became of a finished run's report.
#[derive(Debug)]
pub enum RunOutcome {
    /// No plan produced a signal; nothing was sent.
    NoResults,
    Delivered(Delivery),
    NotifyFailed(NotifyError),
}

impl RunOutcome {
    /// Process exit code: 0 delivered, 2 no results, 3 delivery failed.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Delivered(_) => 0,
            RunOutcome::NoResults => 2,
            RunOutcome::NotifyFailed(_) => 3,
        }
    }
}

/// Render `report` and hand it to `gateway`. A report without results is
/// never sent.
pub fn deliver(report: &RunReport, style: &ReportStyle, gateway: &dyn NotificationGateway) -> RunOutcome {
    if !report.has_results() {
        error!(run_id = %report.run_id, failures = report.failures.len(), "no plan produced a signal");
        return RunOutcome::NoResults;
    }

    let text = format_report(report, style);
    match gateway.send(&text) {
        Ok(delivery) => {
            info!(run_id = %report.run_id, gateway = %delivery.gateway, status = ?delivery.status, "report delivered");
            RunOutcome::Delivered(delivery)
        }
        Err(err) => {
            error!(run_id = %report.run_id, gateway = gateway.name(), error = %err, "report delivery failed");
            RunOutcome::NotifyFailed(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use edca_core::classifier::SignalStatus;
    use edca_core::structure::StructureTrend;

    fn result(symbol: &str, amount: f64) -> SignalResult {
        SignalResult {
            display_name: symbol.to_string(),
            symbol: symbol.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            price: 100.0,
            rsi: Some(50.0),
            structure_trend: StructureTrend::Sideway,
            status: SignalStatus::Fair,
            note: String::new(),
            multiplier: 1.0,
            invest_amount: amount,
            base_budget: 1000.0,
        }
    }

    #[test]
    fn totals_sum_unrounded() {
        let report = RunReport {
            run_id: "x".into(),
            as_of: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            rule_set: RuleSet::Structural,
            currency: "THB".into(),
            results: vec![result("A", 1200.4), result("B", 599.4)],
            failures: vec![],
        };
        assert!((report.total_invest() - 1799.8).abs() < 1e-9);
        assert!(report.has_results());
    }

    fn report_with(results: Vec<SignalResult>) -> RunReport {
        RunReport {
            run_id: "r1".into(),
            as_of: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            rule_set: RuleSet::Structural,
            currency: "THB".into(),
            results,
            failures: vec![],
        }
    }

    /// Gateway that keeps every message it is given.
    #[derive(Default)]
    struct RecordingGateway {
        sent: Mutex<Vec<String>>,
    }

    impl NotificationGateway for RecordingGateway {
        fn name(&self) -> &str {
            "recording"
        }

        fn send(&self, text: &str) -> Result<Delivery, NotifyError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(Delivery {
                gateway: self.name().to_string(),
                status: Some(200),
            })
        }
    }

    /// Gateway whose every send is rejected.
    struct RejectingGateway;

    impl NotificationGateway for RejectingGateway {
        fn name(&self) -> &str {
            "rejecting"
        }

        fn send(&self, _text: &str) -> Result<Delivery, NotifyError> {
            Err(NotifyError::Rejected {
                status: 401,
                body: "invalid token".into(),
            })
        }
    }

    #[test]
    fn deliver_sends_rendered_report() {
        let gateway = RecordingGateway::default();
        let outcome = deliver(&report_with(vec![result("SPY", 1000.0)]), &ReportStyle::default(), &gateway);
        assert!(matches!(&outcome, RunOutcome::Delivered(d) if d.gateway == "recording"));
        assert_eq!(outcome.exit_code(), 0);

        let sent = gateway.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("📌 SPY"));
    }

    #[test]
    fn deliver_skips_empty_report() {
        let gateway = RecordingGateway::default();
        let outcome = deliver(&report_with(vec![]), &ReportStyle::default(), &gateway);
        assert!(matches!(outcome, RunOutcome::NoResults));
        assert_eq!(outcome.exit_code(), 2);
        assert!(gateway.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn deliver_reports_gateway_failure() {
        let outcome = deliver(&report_with(vec![result("SPY", 1000.0)]), &ReportStyle::default(), &RejectingGateway);
        assert!(matches!(
            outcome,
            RunOutcome::NotifyFailed(NotifyError::Rejected { status: 401, .. })
        ));
        assert_eq!(outcome.exit_code(), 3);
    }

    #[test]
    fn huge_lookback_is_a_plan_failure_not_a_panic() {
        let config = AppConfig {
            lookback_days: u32::MAX,
            parallel: false,
            ..AppConfig::default()
        };
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let report = run_batch(&config, &SyntheticProvider::default(), as_of).unwrap();
        assert!(!report.has_results());
        assert_eq!(report.failures.len(), config.plans.len());
        assert!(report.failures.iter().all(|f| f.kind == FailureKind::InvalidWindow));
        assert!(matches!(deliver(&report, &ReportStyle::default(), &RejectingGateway), RunOutcome::NoResults));
    }

    #[test]
    fn provider_selection() {
        let csv = ProviderConfig {
            kind: ProviderKind::Csv,
            ..ProviderConfig::default()
        };
        assert_eq!(provider_for(&csv).unwrap().name(), "csv");
        let synthetic = ProviderConfig {
            kind: ProviderKind::Synthetic,
            ..ProviderConfig::default()
        };
        assert_eq!(provider_for(&synthetic).unwrap().name(), "synthetic");
    }

    #[test]
    fn failure_kind_from_error() {
        let plan = FundPlan::new("SPY", "S&P 500", 1.0);
        let err = EvalError::InsufficientHistory {
            symbol: "SPY".into(),
            bars: 12,
            required: 200,
        };
        let failure = PlanFailure::new(&plan, &err);
        assert_eq!(failure.kind, FailureKind::InsufficientHistory);
        assert!(failure.message.contains("12 bars"));
    }
}
