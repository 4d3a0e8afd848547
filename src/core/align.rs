//! Aligns a benchmark and its comparison series on the benchmark's calendar.

use crate::core::error::{AlignError, RowConversionError};
use crate::core::price::PriceTable;
use chrono::NaiveDate;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A ticker column and the key it is published under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Column {
    pub fn new(symbol: &str) -> Self {
        Column {
            symbol: symbol.to_string(),
            label: None,
        }
    }

    pub fn labeled(symbol: &str, label: &str) -> Self {
        Column {
            symbol: symbol.to_string(),
            label: Some(label.to_string()),
        }
    }

    /// Output key, the symbol itself unless a label was configured.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.symbol)
    }
}

/// One aligned trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub date: NaiveDate,
    pub benchmark_price: f64,
    pub comparison_prices: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub records: Vec<Record>,
    /// Rows dropped because a value could not be converted.
    pub skipped: usize,
}

/// Rounds half away from zero to two decimals.
///
/// Returns `None` for values that are not finite or do not fit a decimal.
pub fn round_price(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
}

/// Absent and NaN cells carry no price. Zero is a price.
fn is_present(value: Option<f64>) -> bool {
    value.is_some_and(|v| !v.is_nan())
}

fn convert(date: NaiveDate, ticker: &str, value: f64) -> Result<f64, RowConversionError> {
    round_price(value).ok_or_else(|| RowConversionError {
        date,
        ticker: ticker.to_string(),
        value,
    })
}

fn align_row(
    table: &PriceTable,
    date: NaiveDate,
    benchmark: &str,
    comparisons: &[Column],
) -> Result<Record, RowConversionError> {
    let raw = table.get(date, benchmark).unwrap_or(f64::NAN);
    let benchmark_price = convert(date, benchmark, raw)?;

    let mut comparison_prices = BTreeMap::new();
    for column in comparisons {
        let value = table.get(date, &column.symbol);
        let price = if is_present(value) {
            Some(convert(date, &column.symbol, value.unwrap_or(f64::NAN))?)
        } else {
            None
        };
        comparison_prices.insert(column.label().to_string(), price);
    }

    Ok(Record {
        date,
        benchmark_price,
        comparison_prices,
    })
}

/// Builds one record per date on which `benchmark` has a price.
///
/// Comparison columns missing from the table, or missing on a given date,
/// come out as `None`. A table without any rows aligns to nothing; a table
/// with rows but no benchmark column is an error.
pub fn align(
    table: &PriceTable,
    benchmark: &str,
    comparisons: &[Column],
) -> Result<Alignment, AlignError> {
    if table.is_empty() {
        debug!("Price table is empty, nothing to align");
        return Ok(Alignment::default());
    }
    if !table.has_column(benchmark) {
        return Err(AlignError::MissingBenchmark {
            ticker: benchmark.to_string(),
        });
    }

    let mut alignment = Alignment::default();
    for date in table
        .dates()
        .filter(|d| is_present(table.get(*d, benchmark)))
    {
        match align_row(table, date, benchmark, comparisons) {
            Ok(record) => alignment.records.push(record),
            Err(e) => {
                warn!(error = %e, "Skipping row");
                alignment.skipped += 1;
            }
        }
    }

    debug!(
        records = alignment.records.len(),
        skipped = alignment.skipped,
        "Aligned {} input dates",
        table.len()
    );
    Ok(alignment)
}

/// A fixed benchmark and comparison set, applied to each fetched table.
#[derive(Debug, Clone)]
pub struct SeriesAligner {
    benchmark: Column,
    comparisons: Vec<Column>,
}

impl SeriesAligner {
    pub fn new(benchmark: Column, comparisons: Vec<Column>) -> Self {
        SeriesAligner {
            benchmark,
            comparisons,
        }
    }

    pub fn benchmark(&self) -> &Column {
        &self.benchmark
    }

    pub fn comparisons(&self) -> &[Column] {
        &self.comparisons
    }

    /// Every ticker the aligner reads, benchmark first.
    pub fn tickers(&self) -> Vec<String> {
        std::iter::once(&self.benchmark)
            .chain(&self.comparisons)
            .map(|c| c.symbol.clone())
            .collect()
    }

    pub fn align(&self, table: &PriceTable) -> Result<Alignment, AlignError> {
        align(table, &self.benchmark.symbol, &self.comparisons)
    }
}
