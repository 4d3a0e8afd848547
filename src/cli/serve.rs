use crate::core::config::AppConfig;
use crate::core::price::DailyPriceProvider;
use crate::server::{self, state::AppState};
use anyhow::{Context, Result};
use chrono::Duration;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Binds the configured address and serves the history API until Ctrl+C.
pub async fn run(provider: Arc<dyn DailyPriceProvider>, config: &AppConfig) -> Result<()> {
    let port = config
        .server
        .resolve_port(std::env::var("PORT").ok().as_deref())?;
    let host = config.server.host.as_str();

    let state = AppState::new(
        provider,
        config.series.clone(),
        Duration::seconds(config.server.cache_ttl_secs),
    );
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))?;
    info!(
        benchmark = %config.series.benchmark.symbol,
        comparisons = config.series.comparisons.len(),
        "Serving price history"
    );

    server::serve(listener, state).await
}
