use super::ui::{self, StyleType};
use crate::core::config::AppConfig;
use crate::core::history::fetch_history;
use crate::core::price::DailyPriceProvider;
use crate::export::StaticExporter;
use anyhow::Result;
use std::path::PathBuf;

/// Fetches the configured series once and writes it as a static JSON file.
pub async fn run(
    provider: &dyn DailyPriceProvider,
    config: &AppConfig,
    output: Option<PathBuf>,
) -> Result<()> {
    let request = config.series.history_request();
    let output = output.unwrap_or_else(|| PathBuf::from(&config.export.output_path));
    let exporter = StaticExporter::new(
        output,
        config.series.layout,
        config.series.benchmark.label(),
    );

    let pb = ui::new_spinner("Downloading prices from Yahoo Finance");
    let records = fetch_history(provider, &request).await;
    pb.finish_and_clear();
    let records = records?;

    exporter.export(&records)?;

    println!(
        "{}",
        ui::style_text(
            &format!(
                "Wrote {} trading days to {}",
                records.len(),
                exporter.output_path().display()
            ),
            StyleType::Success
        )
    );
    if let (Some(first), Some(last)) = (records.first(), records.last()) {
        println!(
            "{}",
            ui::style_text(
                &format!("Range: {} to {}", first.date, last.date),
                StyleType::Subtle
            )
        );
    }
    Ok(())
}
