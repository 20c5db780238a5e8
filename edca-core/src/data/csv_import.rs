//! CSV file provider.
//!
//! Reads `<dir>/<SYMBOL>.csv` with a header row containing at least
//! `date,open,high,low,close` (any case, any column order). `volume` is
//! optional; extra columns such as `adj_close` are ignored. Dates are
//! `YYYY-MM-DD`. Empty price cells become missing values.

use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::debug;

const REQUIRED: [&str; 5] = ["date", "open", "high", "low", "close"];

/// Loads bars from a directory of per-symbol CSV files.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, String> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        for name in REQUIRED {
            if find(name).is_none() {
                return Err(format!("missing column '{name}'"));
            }
        }
        // All required columns were found above
        let col = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            date: col("date"),
            open: col("open"),
            high: col("high"),
            low: col("low"),
            close: col("close"),
            volume: find("volume"),
        })
    }
}

fn parse_price(field: Option<&str>) -> Result<Option<f64>, String> {
    match field.map(str::trim) {
        None | Some("") | Some("null") | Some("NaN") => Ok(None),
        Some(s) => s.parse::<f64>().map(Some).map_err(|e| format!("bad number '{s}': {e}")),
    }
}

fn parse_volume(field: Option<&str>) -> Result<u64, String> {
    match field.map(str::trim) {
        None | Some("") => Ok(0),
        Some(s) => s
            .parse::<u64>()
            .or_else(|_| s.parse::<f64>().map(|v| v.max(0.0) as u64))
            .map_err(|e| format!("bad volume '{s}': {e}")),
    }
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `symbol`.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Parse every row of a CSV file.
    pub fn read_file(path: &Path) -> Result<Vec<RawBar>, DataError> {
        let csv_err = |reason: String| DataError::Csv {
            path: path.display().to_string(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| csv_err(e.to_string()))?;
        let headers = reader.headers().map_err(|e| csv_err(e.to_string()))?.clone();
        let cols = Columns::from_headers(&headers).map_err(csv_err)?;

        let mut bars = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| csv_err(e.to_string()))?;
            let row = |reason: String| csv_err(format!("row {}: {reason}", line + 2));

            let raw_date = record.get(cols.date).unwrap_or_default();
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
                .map_err(|e| row(format!("bad date '{raw_date}': {e}")))?;

            bars.push(RawBar {
                date,
                open: parse_price(record.get(cols.open)).map_err(row)?,
                high: parse_price(record.get(cols.high)).map_err(row)?,
                low: parse_price(record.get(cols.low)).map_err(row)?,
                close: parse_price(record.get(cols.close)).map_err(row)?,
                volume: parse_volume(cols.volume.and_then(|i| record.get(i))).map_err(row)?,
            });
        }
        Ok(bars)
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let bars: Vec<RawBar> = Self::read_file(&path)?
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        debug!(symbol, path = %path.display(), bars = bars.len(), "loaded csv");

        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}
