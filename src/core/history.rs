//! One fetch-and-align cycle for a configured benchmark/comparison set.

use crate::core::align::{Record, SeriesAligner};
use crate::core::error::HistoryError;
use crate::core::price::DailyPriceProvider;
use chrono::NaiveDate;
use tracing::{info, instrument};

/// What to fetch and how to align it.
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    pub aligner: SeriesAligner,
    pub start: NaiveDate,
    pub adjusted: bool,
}

/// Fetches every ticker the aligner needs and aligns the result.
#[instrument(
    name = "FetchHistory",
    skip_all,
    fields(benchmark = %request.aligner.benchmark().symbol, start = %request.start)
)]
pub async fn fetch_history(
    provider: &dyn DailyPriceProvider,
    request: &HistoryRequest,
) -> Result<Vec<Record>, HistoryError> {
    let tickers = request.aligner.tickers();
    let table = provider
        .fetch_daily_prices(&tickers, request.start, request.adjusted)
        .await?;

    let alignment = request.aligner.align(&table)?;
    info!(
        records = alignment.records.len(),
        skipped = alignment.skipped,
        "Price history ready"
    );
    Ok(alignment.records)
}
