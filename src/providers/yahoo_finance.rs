use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use futures::future::try_join_all;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::core::error::ProviderError;
use crate::core::price::{DailyPriceProvider, PriceTable};

type DailyCloses = Vec<(NaiveDate, Option<f64>)>;

// YahooFinanceProvider implementation for DailyPriceProvider
pub struct YahooFinanceProvider {
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str) -> Self {
        YahooFinanceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    #[serde(default)]
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(rename = "gmtoffset", default)]
    gmt_offset: Option<i32>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

/// Turns one chart item into exchange-local trading dates with closes.
fn extract_daily_closes(symbol: &str, item: &ChartItem, adjusted: bool) -> DailyCloses {
    let Some(timestamps) = item.timestamp.as_ref() else {
        debug!(symbol, "Chart has no timestamps");
        return Vec::new();
    };

    let offset = item
        .meta
        .as_ref()
        .and_then(|m| m.gmt_offset)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());

    let indicators = item.indicators.as_ref();
    let close = indicators
        .and_then(|inds| inds.quote.first())
        .and_then(|q| q.close.as_ref());
    let adjclose = indicators
        .and_then(|inds| inds.adjclose.as_ref())
        .and_then(|a| a.first())
        .and_then(|a| a.adjclose.as_ref());

    let closes = match (adjusted, adjclose) {
        (true, Some(adj)) => Some(adj),
        (true, None) => {
            debug!(symbol, "No adjusted closes, falling back to raw closes");
            close
        }
        (false, _) => close,
    };

    timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let Some(dt) = DateTime::from_timestamp(*ts, 0) else {
                debug!(symbol, ts, "Skipping invalid timestamp");
                return None;
            };
            let date = dt.with_timezone(&offset).date_naive();
            let price = closes.and_then(|c| c.get(i).copied().flatten());
            Some((date, price))
        })
        .collect()
}

impl YahooFinanceProvider {
    /// `Ok(None)` when Yahoo does not know the symbol.
    #[instrument(name = "YahooDailyFetch", skip(self, client), fields(symbol = %symbol))]
    async fn fetch_symbol(
        &self,
        client: &reqwest::Client,
        symbol: &str,
        period1: i64,
        period2: i64,
        adjusted: bool,
    ) -> Result<Option<DailyCloses>, ProviderError> {
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=div%7Csplit&includeAdjustedClose=true",
            self.base_url, symbol, period1, period2
        );
        debug!("Requesting daily prices from {}", url);

        let response = client.get(&url).send().await.map_err(|e| {
            ProviderError::Unavailable(format!("Request error: {e} for symbol: {symbol}"))
        })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            warn!(symbol, "Symbol not found upstream");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ProviderError::Unavailable(format!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            )));
        }

        let text = response.text().await?;
        let data: YahooChartResponse = serde_json::from_str(&text).map_err(|e| {
            ProviderError::Unavailable(format!("Failed to parse JSON response for {symbol}: {e}"))
        })?;

        let Some(item) = data.chart.result.as_ref().and_then(|r| r.first()) else {
            match data.chart.error {
                Some(err) => warn!(
                    symbol,
                    code = %err.code,
                    description = err.description.as_deref().unwrap_or_default(),
                    "No chart data returned"
                ),
                None => warn!(symbol, "No chart data returned"),
            }
            return Ok(None);
        };

        let closes = extract_daily_closes(symbol, item, adjusted);
        debug!(rows = closes.len(), "Parsed daily closes");
        Ok(Some(closes))
    }
}

#[async_trait]
impl DailyPriceProvider for YahooFinanceProvider {
    async fn fetch_daily_prices(
        &self,
        tickers: &[String],
        start: NaiveDate,
        adjusted: bool,
    ) -> Result<PriceTable, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent("etfseries/1.0")
            .build()?;
        let period1 = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = Utc::now().timestamp();

        let fetches = tickers
            .iter()
            .map(|symbol| self.fetch_symbol(&client, symbol, period1, period2, adjusted));
        let results = try_join_all(fetches).await?;

        let mut table = PriceTable::new();
        for (symbol, closes) in tickers.iter().zip(results) {
            let Some(closes) = closes else {
                continue;
            };
            table.add_column(symbol);
            for (date, price) in closes {
                table.insert(date, symbol, price);
            }
        }
        Ok(table)
    }
}
