//! Market data: provider trait, concrete providers and ingest.

pub mod circuit_breaker;
pub mod csv_import;
pub mod ingest;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use csv_import::CsvProvider;
pub use circuit_breaker::CircuitBreaker;
pub use ingest::ingest;
pub use provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
