use chrono::Duration;
use std::sync::Arc;

use crate::core::align::Record;
use crate::core::cache::ResultCache;
use crate::core::config::SeriesConfig;
use crate::core::price::DailyPriceProvider;

/// Shared application state, passed to route handlers via `axum::extract::State`.
pub struct AppState {
    pub provider: Arc<dyn DailyPriceProvider>,
    pub series: SeriesConfig,
    /// Latest aligned history and when it was fetched.
    pub history: ResultCache<Arc<Vec<Record>>>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn DailyPriceProvider>,
        series: SeriesConfig,
        cache_ttl: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            provider,
            series,
            history: ResultCache::new(cache_ttl),
        })
    }
}
