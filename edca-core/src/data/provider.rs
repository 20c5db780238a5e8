//! Where bars come from: the `DataProvider` seam, raw rows and `DataError`.
//!
//! The runner only sees `&dyn DataProvider`, so Yahoo, CSV directories,
//! synthetic walks and test doubles are interchangeable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw daily OHLCV row from a data provider, before validation.
///
/// Price fields are `None` where the source had no value (market holidays in
/// the Yahoo chart response, empty CSV cells). `ingest` drops such rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: u64,
}

impl RawBar {
    /// A fully populated row.
    pub fn complete(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume,
        }
    }
}

/// Why bars for a symbol could not be produced.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("provider unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("provider rate limit hit, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected provider response: {0}")]
    ResponseFormatChanged(String),

    #[error("provider requires authentication: {0}")]
    AuthenticationRequired(String),

    #[error("unknown symbol '{symbol}'")]
    SymbolNotFound { symbol: String },

    #[error("requests blocked while the circuit breaker is open")]
    CircuitBreakerTripped,

    #[error("invalid bar data: {0}")]
    ValidationError(String),

    #[error("{path}: {reason}")]
    Csv { path: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Rows for one symbol, oldest first, not yet validated.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<RawBar>,
    pub source: DataSource,
}

/// Provenance tag carried into evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

/// Source of daily rows. Shared across the runner's worker threads.
pub trait DataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Daily rows for `symbol` with `start <= date <= end`.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError>;

    /// False while the provider is known to refuse requests.
    fn is_available(&self) -> bool;
}
