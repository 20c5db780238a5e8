//! EDCA Runner: batch orchestration on top of `edca-core`.
//!
//! This crate provides:
//! - TOML configuration with fund plans, provider, rule set and notifier
//! - Per-plan evaluation (fetch, ingest, indicators, structure, classify)
//! - Batch runs with isolated per-plan failures
//! - Push-message rendering and LINE / stdout notification gateways

pub mod config;
pub mod evaluate;
pub mod notify;
pub mod report;
pub mod runner;

pub use config::{
    AppConfig, ConfigError, LineCredentials, NotifyConfig, NotifyKind, ProviderConfig, ProviderKind,
};
pub use evaluate::{fetch_window, EvalError, Evaluation, Evaluator};
pub use notify::{
    gateway_for, Delivery, LineGateway, NotificationGateway, NotifyError, StdoutGateway,
};
pub use report::{format_report, format_thousands, ReportStyle};
pub use runner::{
    deliver, evaluator_for, provider_for, run_batch, FailureKind, PlanFailure, RunOutcome, RunReport,
};
