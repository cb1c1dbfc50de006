// HTTP routes: read-only views of the sample log for the dashboard

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tower_http::cors::{Any, CorsLayer};

use crate::sample_store::SampleStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<SampleStore>,
    pub(crate) samples_saved_total: Arc<AtomicU64>,
}

pub fn app(store: Arc<SampleStore>, samples_saved_total: Arc<AtomicU64>) -> Router {
    let state = AppState {
        store,
        samples_saved_total,
    };
    Router::new()
        .route("/", get(|| async { "battery-telemetry is running" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/health", get(http::health_handler)) // GET /api/health
        .route("/api/latest", get(http::latest_handler)) // GET /api/latest
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
