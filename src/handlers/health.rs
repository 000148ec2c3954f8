//! Liveness and health handlers

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

pub const LIVENESS_MESSAGE: &str = "GeoVision API is running";

/// `GET /` - static, independent of model or platform state
pub async fn root() -> Json<Value> {
    Json(json!({ "message": LIVENESS_MESSAGE }))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    project: String,
    model_loaded: bool,
    model_classes: Option<usize>,
    storage_ready: bool,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_loaded = state.classifier.is_some();
    let storage_ready = state.storage.is_some();

    Json(HealthResponse {
        status: if model_loaded && storage_ready { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        project: state.earth_engine.project().to_string(),
        model_loaded,
        model_classes: state.classifier.as_ref().map(|c| c.labels().len()),
        storage_ready,
    })
}
