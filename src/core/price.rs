//! Daily price data model and the provider abstraction

use crate::core::error::ProviderError;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Closing prices per trading date and ticker.
///
/// Rows iterate in ascending date order. A cell may be absent or hold NaN;
/// both mean "no price". The table also tracks which ticker columns it has,
/// so a column with no usable values is still distinguishable from a column
/// the provider never returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    rows: BTreeMap<NaiveDate, HashMap<String, f64>>,
    columns: BTreeSet<String>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `ticker` as a column even if it never receives a value.
    pub fn add_column(&mut self, ticker: &str) {
        self.columns.insert(ticker.to_string());
    }

    /// Sets the cell for `date`/`ticker`. `None` only records the date row and
    /// leaves a price already stored for this cell untouched.
    pub fn insert(&mut self, date: NaiveDate, ticker: &str, price: Option<f64>) {
        self.add_column(ticker);
        let row = self.rows.entry(date).or_default();
        if let Some(p) = price {
            row.insert(ticker.to_string(), p);
        }
    }

    /// Raw cell content. May be NaN.
    pub fn get(&self, date: NaiveDate, ticker: &str) -> Option<f64> {
        self.rows.get(&date).and_then(|row| row.get(ticker)).copied()
    }

    pub fn has_column(&self, ticker: &str) -> bool {
        self.columns.contains(ticker)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Trading dates in ascending order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
pub trait DailyPriceProvider: Send + Sync {
    /// Fetches daily closes for `tickers` from `start` until today.
    ///
    /// With `adjusted` set, closes are adjusted for splits and dividends.
    /// Tickers unknown upstream contribute no column.
    async fn fetch_daily_prices(
        &self,
        tickers: &[String],
        start: NaiveDate,
        adjusted: bool,
    ) -> Result<PriceTable, ProviderError>;
}
