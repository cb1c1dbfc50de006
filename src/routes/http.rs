// GET handlers: version, health report, latest sample

use std::sync::atomic::Ordering;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use super::AppState;
use crate::analysis;
use crate::sample_store::StoreError;
use crate::version::{NAME, VERSION};

/// GET /version: service name and version (from Cargo.toml at build time), plus samples
/// persisted by this process.
pub(super) async fn version_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
        "samplesSaved": state.samples_saved_total.load(Ordering::Relaxed),
    }))
}

/// GET /api/health: health report recomputed from the full log on every request.
pub(super) async fn health_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let samples = state.store.load_all().await.map_err(store_failure)?;
    Ok(Json(analysis::analyze(&samples)))
}

/// GET /api/latest: most recent sample, 404 before the first capture.
pub(super) async fn latest_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    match state.store.latest().await.map_err(store_failure)? {
        Some(sample) => Ok(Json(sample)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "no samples recorded yet" })),
        )),
    }
}

fn store_failure(e: StoreError) -> (StatusCode, Json<serde_json::Value>) {
    tracing::warn!(error = %e, operation = "load_all", "sample log read failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": e.to_string() })),
    )
}
