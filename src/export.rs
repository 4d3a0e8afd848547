//! JSON and CSV sinks for aligned records and raw price tables.

use crate::core::align::{Record, round_price};
use crate::core::price::PriceTable;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// JSON shape of a published record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordLayout {
    /// `{date, benchmarkPrice, comparisonPrices: {label: price|null}}`
    #[default]
    Nested,
    /// `{date, <benchmark label>: price, <label>: price|null, ...}`
    Flat,
}

/// Renders records as a JSON array in the requested layout.
pub fn render_records(
    records: &[Record],
    layout: RecordLayout,
    benchmark_label: &str,
) -> Result<Value> {
    match layout {
        RecordLayout::Nested => Ok(serde_json::to_value(records)?),
        RecordLayout::Flat => Ok(Value::Array(
            records
                .iter()
                .map(|record| {
                    let mut obj = Map::new();
                    obj.insert(
                        "date".to_string(),
                        Value::String(record.date.format("%Y-%m-%d").to_string()),
                    );
                    obj.insert(benchmark_label.to_string(), record.benchmark_price.into());
                    for (label, price) in &record.comparison_prices {
                        obj.insert(label.clone(), (*price).into());
                    }
                    Value::Object(obj)
                })
                .collect(),
        )),
    }
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Writes the aligned history to a fixed JSON file.
pub struct StaticExporter {
    output_path: PathBuf,
    layout: RecordLayout,
    benchmark_label: String,
}

impl StaticExporter {
    pub fn new<P: Into<PathBuf>>(output_path: P, layout: RecordLayout, benchmark_label: &str) -> Self {
        StaticExporter {
            output_path: output_path.into(),
            layout,
            benchmark_label: benchmark_label.to_string(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Writes `records` as a compact UTF-8 JSON array, creating parent
    /// directories as needed.
    pub fn export(&self, records: &[Record]) -> Result<()> {
        let value = render_records(records, self.layout, &self.benchmark_label)?;
        create_parent_dir(&self.output_path)?;

        let file = File::create(&self.output_path).with_context(|| {
            format!("Failed to create output file: {}", self.output_path.display())
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &value)?;
        writer.flush()?;

        info!(
            records = records.len(),
            "Wrote history to {}",
            self.output_path.display()
        );
        Ok(())
    }
}

/// Table rows with prices rounded to two decimals, in ascending date order.
///
/// Cells that are missing, NaN or not representable come out as `None`.
pub fn rounded_rows(table: &PriceTable, tickers: &[String]) -> Vec<(NaiveDate, Vec<Option<f64>>)> {
    table
        .dates()
        .map(|date| {
            let prices = tickers
                .iter()
                .map(|t| table.get(date, t).and_then(round_price))
                .collect();
            (date, prices)
        })
        .collect()
}

/// Writes closes as CSV with a `Date` column and one column per ticker.
///
/// The file starts with a UTF-8 BOM so spreadsheet tools pick the right
/// encoding. Returns the number of data rows written.
pub fn write_price_csv(table: &PriceTable, tickers: &[String], path: &Path) -> Result<usize> {
    create_parent_dir(path)?;
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    file.write_all("\u{feff}".as_bytes())?;

    let mut wtr = csv::Writer::from_writer(file);
    let mut header = vec!["Date".to_string()];
    header.extend(tickers.iter().cloned());
    wtr.write_record(&header)?;

    let rows = rounded_rows(table, tickers);
    for (date, prices) in &rows {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        record.extend(
            prices
                .iter()
                .map(|p| p.map(|v| format!("{v:.2}")).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    debug!(rows = rows.len(), "Wrote CSV to {}", path.display());
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn records() -> Vec<Record> {
        vec![
            Record {
                date: date("2024-01-01"),
                benchmark_price: 100.0,
                comparison_prices: BTreeMap::from([("price2x".to_string(), Some(50.5))]),
            },
            Record {
                date: date("2024-01-03"),
                benchmark_price: 101.25,
                comparison_prices: BTreeMap::from([("price2x".to_string(), None)]),
            },
        ]
    }

    #[test]
    fn test_render_flat_layout() {
        let value = render_records(&records(), RecordLayout::Flat, "price1x").unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"date": "2024-01-01", "price1x": 100.0, "price2x": 50.5},
                {"date": "2024-01-03", "price1x": 101.25, "price2x": null},
            ])
        );
    }

    #[test]
    fn test_render_nested_layout() {
        let value = render_records(&records(), RecordLayout::Nested, "ignored").unwrap();
        assert_eq!(value[1]["benchmarkPrice"], 101.25);
        assert!(value[1]["comparisonPrices"]["price2x"].is_null());
        assert!(value[0].get("ignored").is_none());
    }

    #[test]
    fn test_export_creates_directories_and_writes_compact_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frontend/public/data.json");
        let exporter = StaticExporter::new(&path, RecordLayout::Nested, "price1x");

        exporter.export(&records()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains('\n'));
        let parsed: Vec<Record> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, records());
    }

    #[test]
    fn test_export_empty_history() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        StaticExporter::new(&path, RecordLayout::Flat, "price1x")
            .export(&[])
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_write_price_csv() {
        let mut table = PriceTable::new();
        table.insert(date("2024-01-02"), "2330.TW", Some(593.0));
        table.insert(date("2024-01-02"), "0050.TW", Some(131.456));
        table.insert(date("2024-01-01"), "2330.TW", Some(590.004));
        table.insert(date("2024-01-01"), "0050.TW", Some(f64::NAN));

        let dir = tempdir().unwrap();
        let path = dir.path().join("stocks_compare.csv");
        let tickers = vec!["2330.TW".to_string(), "0050.TW".to_string()];
        let rows = write_price_csv(&table, &tickers, &path).unwrap();
        assert_eq!(rows, 2);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "\u{feff}Date,2330.TW,0050.TW\n2024-01-01,590.00,\n2024-01-02,593.00,131.46\n"
        );
    }
}
