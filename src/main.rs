//! GeoVision API server

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geovision_api::classifier::{ImageClassifier, OnnxClassifier};
use geovision_api::config::Config;
use geovision_api::earth_engine::RestEarthEngine;
use geovision_api::google::auth::{ServiceAccountKey, TokenProvider};
use geovision_api::google::storage::StorageClient;
use geovision_api::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let json_logs = std::env::var("ENVIRONMENT").is_ok_and(|env| env == "production");

    // Initialize logging (JSON lines in production)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "geovision_api=debug,tower_http=debug".into()))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    // Load configuration; missing required settings stop the process here
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            return Err(e).context("invalid configuration");
        }
    };

    tracing::info!("GeoVision API starting ({})", config.environment);
    if !config.is_production() {
        tracing::debug!("{:?}", config);
    }

    // An unreadable or unusable key is fatal; nothing upstream works without it
    let key = ServiceAccountKey::from_file(&config.service_account_key_path)
        .context("failed to load service account key")?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("geovision-api/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let tokens = Arc::new(TokenProvider::new(key, http.clone()));
    let project = config
        .project
        .clone()
        .unwrap_or_else(|| tokens.project_id().to_string());
    tracing::info!("Earth Engine project: {} ({})", project, tokens.client_email());

    let earth_engine = Arc::new(RestEarthEngine::new(
        http.clone(),
        tokens.clone(),
        config.gee_api_url.clone(),
        project,
    ));

    // Exports answer 503 until the process is restarted with a reachable bucket
    let storage = match StorageClient::connect(&http, &tokens, &config.gcs_api_url, &config.export_bucket).await {
        Ok(storage) => Some(storage),
        Err(e) => {
            tracing::error!("Storage client unavailable, exports disabled: {}", e);
            None
        }
    };

    // Prediction answers 500 if the model cannot be loaded
    let classifier: Option<Arc<dyn ImageClassifier>> =
        match OnnxClassifier::load(&config.model_path, &config.labels_path, config.model_input_size) {
            Ok(model) => Some(Arc::new(model) as Arc<dyn ImageClassifier>),
            Err(e) => {
                tracing::error!("Model unavailable, prediction disabled: {}", e);
                None
            }
        };

    let state = AppState {
        earth_engine,
        storage,
        classifier,
    };

    let app = create_router(state, config.max_upload_bytes);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
