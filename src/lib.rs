//! GeoVision API
//!
//! Thin HTTP front for Google Earth Engine and a building floor classifier.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        GEOVISION API                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌──────────────────┐   ┌───────────────┐  │
//! │  │  Axum       │──▶│  Earth Engine    │──▶│ earthengine.  │  │
//! │  │  router     │   │  REST client     │   │ googleapis    │  │
//! │  │             │   └──────────────────┘   └───────────────┘  │
//! │  │             │   ┌──────────────────┐   ┌───────────────┐  │
//! │  │             │──▶│  Storage client  │──▶│ Cloud Storage │  │
//! │  │             │   └──────────────────┘   └───────────────┘  │
//! │  │             │   ┌──────────────────┐                      │
//! │  │             │──▶│  ONNX classifier │  (in process)        │
//! │  └─────────────┘   └──────────────────┘                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod classifier;
pub mod config;
pub mod earth_engine;
pub mod error;
pub mod google;
pub mod handlers;
pub mod models;
pub mod relabel;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::classifier::ImageClassifier;
use crate::earth_engine::EarthEngine;
use crate::google::storage::StorageClient;

pub use error::{AppError, AppResult};

/// Shared application state
///
/// Built once at startup and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub earth_engine: Arc<dyn EarthEngine>,
    /// `None` when the export bucket could not be reached at startup
    pub storage: Option<StorageClient>,
    /// `None` when the model failed to load
    pub classifier: Option<Arc<dyn ImageClassifier>>,
}

/// Create the main router with all routes
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::check))
        // Earth Engine proxy
        .route("/get_gee_map_layer", post(handlers::gee::get_map_layer))
        .route("/export_gee_image", post(handlers::gee::export_image))
        // Floor classifier
        .route("/predict/", post(handlers::predict::predict))
        .route("/predict", post(handlers::predict::predict))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
