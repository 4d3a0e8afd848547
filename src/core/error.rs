//! Error kinds shared by the provider, aligner and fetch cycle.

use chrono::NaiveDate;
use thiserror::Error;

/// Failure talking to the upstream price provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::Unavailable(e.to_string())
    }
}

/// Failure that aborts a whole alignment.
#[derive(Debug, Error, PartialEq)]
pub enum AlignError {
    #[error("Benchmark column {ticker} not found in price table")]
    MissingBenchmark { ticker: String },
}

/// A single date row that could not be turned into a record.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Cannot convert {ticker} value {value} on {date}")]
pub struct RowConversionError {
    pub date: NaiveDate,
    pub ticker: String,
    pub value: f64,
}

/// Failure of one fetch-and-align cycle.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Align(#[from] AlignError),
}
