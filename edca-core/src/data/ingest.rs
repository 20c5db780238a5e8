//! Raw rows → validated `Bar` sequence.
//!
//! - rows with any missing OHLC value are dropped (market holidays)
//! - rows failing `Bar::is_sane` (non-finite, non-positive, high < low, ...)
//!   are dropped with a warning
//! - the result is sorted by date; two rows on the same date are an error

use super::provider::{DataError, RawBar};
use crate::domain::Bar;
use tracing::{debug, warn};

/// Validate and order raw rows for `symbol`.
pub fn ingest(symbol: &str, raw: Vec<RawBar>) -> Result<Vec<Bar>, DataError> {
    let total = raw.len();
    let mut missing = 0usize;
    let mut insane = 0usize;

    let mut bars: Vec<Bar> = raw
        .into_iter()
        .filter_map(|r| {
            let (Some(open), Some(high), Some(low), Some(close)) = (r.open, r.high, r.low, r.close) else {
                missing += 1;
                return None;
            };
            let bar = Bar {
                symbol: symbol.to_string(),
                date: r.date,
                open,
                high,
                low,
                close,
                volume: r.volume,
            };
            if bar.is_sane() {
                Some(bar)
            } else {
                warn!(symbol, date = %r.date, "dropping inconsistent bar");
                insane += 1;
                None
            }
        })
        .collect();

    bars.sort_by_key(|b| b.date);
    if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(DataError::ValidationError(format!(
            "{symbol}: duplicate bar for {}",
            pair[0].date
        )));
    }

    debug!(symbol, total, kept = bars.len(), missing, insane, "ingested bars");
    Ok(bars)
}
