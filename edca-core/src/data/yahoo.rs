//! Daily bars from the Yahoo Finance v8 chart endpoint.
//!
//! Transient failures (timeouts, 429, 5xx) are retried with exponential
//! backoff. 403 trips the shared circuit breaker. The endpoint is unofficial
//! and changes without notice; point the config at `CsvProvider` when it
//! breaks.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
use chrono::{NaiveDate, NaiveTime};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// v8 chart payload, only the fields read here.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Outcome of a failed request attempt.
enum Attempt {
    Retry(DataError),
    Fatal(DataError),
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    /// Provider with a 30 s request timeout.
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        Self::with_timeout(circuit_breaker, Duration::from_secs(30))
    }

    pub fn with_timeout(circuit_breaker: Arc<CircuitBreaker>, timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive: include the whole end day
        let end_ts = end.and_time(NaiveTime::MIN).and_utc().timestamp() + 86_399;
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<RawBar>, DataError> {
        let changed = |msg: &str| DataError::ResponseFormatChanged(msg.to_string());

        let Some(results) = resp.chart.result else {
            return Err(match resp.chart.error {
                Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                },
                Some(err) => changed(&format!("{}: {}", err.code, err.description)),
                None => changed("chart has neither result nor error"),
            });
        };
        let data = results.into_iter().next().ok_or_else(|| changed("empty result array"))?;
        let timestamps = data.timestamp.ok_or_else(|| changed("missing timestamp array"))?;
        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| changed("missing quote block"))?;

        let at = |series: &[Option<f64>], i: usize| series.get(i).copied().flatten();
        let mut bars = timestamps
            .iter()
            .enumerate()
            .map(|(i, &ts)| -> Result<RawBar, DataError> {
                let date = chrono::DateTime::from_timestamp(ts, 0)
                    .map(|dt| dt.date_naive())
                    .ok_or_else(|| changed(&format!("timestamp out of range: {ts}")))?;
                Ok(RawBar {
                    date,
                    open: at(&quote.open, i),
                    high: at(&quote.high, i),
                    low: at(&quote.low, i),
                    close: at(&quote.close, i),
                    volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
                })
            })
            .collect::<Result<Vec<_>, DataError>>()?;

        // During a session the live bar can arrive as a second row for the
        // last date; the later row wins
        let n = bars.len();
        if n >= 2 && bars[n - 2].date == bars[n - 1].date {
            bars.remove(n - 2);
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }

    /// One HTTP round trip. Transient failures come back as `Attempt::Retry`.
    fn attempt(&self, url: &str, symbol: &str) -> Result<Vec<RawBar>, Attempt> {
        let resp = self.client.get(url).send().map_err(|e| {
            let err = DataError::NetworkUnreachable(e.to_string());
            if e.is_connect() || e.is_timeout() {
                warn!(symbol, error = %e, "chart request failed");
                Attempt::Retry(err)
            } else {
                Attempt::Fatal(err)
            }
        })?;

        let status = resp.status();
        match status {
            StatusCode::FORBIDDEN => {
                self.circuit_breaker.trip();
                return Err(Attempt::Fatal(DataError::CircuitBreakerTripped));
            }
            StatusCode::UNAUTHORIZED => {
                return Err(Attempt::Fatal(DataError::AuthenticationRequired(format!(
                    "chart request for {symbol} was refused"
                ))));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                self.circuit_breaker.record_failure();
                let retry_after_secs = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!(symbol, retry_after_secs, "rate limited");
                return Err(Attempt::Retry(DataError::RateLimited { retry_after_secs }));
            }
            s if !s.is_success() => {
                self.circuit_breaker.record_failure();
                return Err(Attempt::Retry(DataError::Other(format!("HTTP {s} for {symbol}"))));
            }
            _ => {}
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            Attempt::Fatal(DataError::ResponseFormatChanged(format!("{symbol}: {e}")))
        })?;
        Self::parse_response(symbol, chart).map_err(Attempt::Fatal)
    }

    fn fetch_with_retry(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<RawBar>, DataError> {
        let url = Self::chart_url(symbol, start, end);
        let mut last_error = DataError::Other(format!("no request sent for {symbol}"));

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(symbol, attempt, delay_ms = delay.as_millis() as u64, "backing off");
                std::thread::sleep(delay);
            }
            if !self.circuit_breaker.is_allowed() {
                warn!(
                    symbol,
                    remaining_secs = self.circuit_breaker.remaining_cooldown().as_secs(),
                    "circuit breaker open, skipping request"
                );
                return Err(DataError::CircuitBreakerTripped);
            }

            match self.attempt(&url, symbol) {
                Ok(bars) => {
                    self.circuit_breaker.record_success();
                    debug!(symbol, rows = bars.len(), "chart fetched");
                    return Ok(bars);
                }
                Err(Attempt::Fatal(err)) => return Err(err),
                Err(Attempt::Retry(err)) => last_error = err,
            }
        }
        Err(last_error)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        let bars = self.fetch_with_retry(symbol, start, end)?;
        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
