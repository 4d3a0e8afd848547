use super::ui::{self, StyleType};
use crate::core::config::DownloadConfig;
use crate::core::price::DailyPriceProvider;
use crate::core::symbol::{normalize_ticker, parse_ticker_list};
use crate::export::{rounded_rows, write_price_csv};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info};

const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Symbols as typed by the user, before normalization. Prompted for when empty.
    pub tickers: Vec<String>,
    pub start: Option<NaiveDate>,
    pub output: Option<PathBuf>,
}

/// Asks for space separated ticker symbols on `reader`.
pub fn prompt_tickers<R: BufRead, W: Write>(reader: &mut R, writer: &mut W) -> Result<Vec<String>> {
    writeln!(writer, "Enter one or more ticker symbols separated by spaces")?;
    writeln!(writer, "  e.g. 0050 2330 0056")?;
    write!(writer, "> ")?;
    writer.flush()?;

    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(parse_ticker_list(&line))
}

/// `<input>_history.csv` for one ticker, `stocks_compare.csv` for several.
pub fn default_csv_name(inputs: &[String]) -> PathBuf {
    match inputs {
        [single] => PathBuf::from(format!("{}_history.csv", single.trim())),
        _ => PathBuf::from("stocks_compare.csv"),
    }
}

/// Normalizes `inputs` and drops repeats.
///
/// Returns the tickers plus the raw input that produced each one.
fn dedupe_tickers(inputs: Vec<String>, config: &DownloadConfig) -> (Vec<String>, Vec<String>) {
    let mut tickers: Vec<String> = Vec::with_capacity(inputs.len());
    let mut unique_inputs = Vec::with_capacity(inputs.len());
    for raw in inputs {
        let ticker = normalize_ticker(&raw, &config.default_suffix, &config.known_suffixes);
        if !tickers.contains(&ticker) {
            tickers.push(ticker);
            unique_inputs.push(raw);
        }
    }
    (tickers, unique_inputs)
}

/// Downloads adjusted closes for the requested tickers into a CSV file.
pub async fn run<R: BufRead, W: Write>(
    provider: &dyn DailyPriceProvider,
    config: &DownloadConfig,
    options: DownloadOptions,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let inputs = if options.tickers.is_empty() {
        prompt_tickers(input, out)?
    } else {
        options.tickers
    };
    if inputs.is_empty() {
        bail!("No ticker symbols given");
    }

    let (tickers, unique_inputs) = dedupe_tickers(inputs, config);
    let start = options.start.unwrap_or(config.start_date);
    let output = options
        .output
        .unwrap_or_else(|| default_csv_name(&unique_inputs));
    info!(?tickers, %start, "Downloading daily closes");

    let pb = ui::new_spinner(&format!("Downloading {}", tickers.join(", ")));
    let table = provider.fetch_daily_prices(&tickers, start, true).await;
    pb.finish_and_clear();
    let table = table?;

    if table.is_empty() {
        writeln!(
            out,
            "{}",
            ui::style_text(
                &format!("No data found for {}", tickers.join(", ")),
                StyleType::Error
            )
        )?;
        return Ok(());
    }

    let rows = write_price_csv(&table, &tickers, &output)?;
    debug!(rows, "CSV written");

    writeln!(
        out,
        "{}",
        ui::style_text(&format!("Downloaded {rows} trading days"), StyleType::Success)
    )?;
    writeln!(
        out,
        "{}",
        ui::style_text(
            "Prices are split and dividend adjusted, rounded to 2 decimals",
            StyleType::Subtle
        )
    )?;
    writeln!(out, "Saved to {}", output.display())?;

    let all_rows = rounded_rows(&table, &tickers);
    let mut preview = ui::new_styled_table();
    let mut header = vec![ui::header_cell("Date")];
    header.extend(tickers.iter().map(|t| ui::header_cell(t)));
    preview.set_header(header);
    for (date, prices) in &all_rows[all_rows.len().saturating_sub(PREVIEW_ROWS)..] {
        let mut row = vec![comfy_table::Cell::new(date.format("%Y-%m-%d"))];
        row.extend(prices.iter().map(|p| ui::price_cell(*p)));
        preview.add_row(row);
    }
    writeln!(out, "\n{}", ui::style_text("Last trading days", StyleType::Title))?;
    writeln!(out, "{preview}")?;

    Ok(())
}
