//! EDCA Core: price bars, indicators, market structure and signal rules.
//!
//! This crate turns a daily bar history into a DCA contribution signal:
//! - Domain types (bars, fund plans)
//! - Indicators (RSI, Bollinger, MACD, SMA) behind the `Indicator` trait
//! - Swing detection and the break-of-structure trend scan
//! - `IndicatorEngine` producing per-bar snapshots
//! - Ordered rule tables and the `SignalClassifier`
//! - Data providers (Yahoo Finance, CSV, synthetic) and ingest

pub mod classifier;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod structure;
