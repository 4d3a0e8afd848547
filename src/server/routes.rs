use axum::{Json, Router, extract::State, routing::get};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::core::history::fetch_history;
use crate::export::render_records;
use crate::server::error::ApiError;
use crate::server::state::AppState;

pub const LIVENESS_MESSAGE: &str = "Price history API is running!";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/api/history", get(history))
}

/// GET / — liveness probe.
async fn home() -> &'static str {
    LIVENESS_MESSAGE
}

/// GET /api/history — aligned benchmark and comparison closes.
async fn history(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let records = state
        .history
        .refresh_if_stale(Utc::now(), || async {
            let request = state.series.history_request();
            debug!("Refreshing price history");
            fetch_history(state.provider.as_ref(), &request)
                .await
                .map(Arc::new)
        })
        .await?;

    let body = render_records(
        &records,
        state.series.layout,
        state.series.benchmark.label(),
    )?;
    Ok(Json(body))
}
