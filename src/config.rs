//! Configuration module

use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Default Earth Engine REST endpoint
pub const DEFAULT_GEE_API_URL: &str = "https://earthengine.googleapis.com";

/// Default Cloud Storage JSON API endpoint
pub const DEFAULT_GCS_API_URL: &str = "https://storage.googleapis.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Google service account key (JSON)
    pub service_account_key_path: PathBuf,

    /// Cloud Storage bucket receiving Earth Engine exports
    pub export_bucket: String,

    /// Earth Engine project override; defaults to the key's project_id
    pub project: Option<String>,

    /// Server port
    pub port: u16,

    /// ONNX model file for the floor classifier
    pub model_path: PathBuf,

    /// JSON array of class labels, index-aligned with the model output
    pub labels_path: PathBuf,

    /// Square input size expected by the model
    pub model_input_size: u32,

    /// Upper bound for request bodies (image uploads)
    pub max_upload_bytes: usize,

    pub gee_api_url: String,

    pub gcs_api_url: String,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let service_account_key_path = env::var("GEE_SERVICE_ACCOUNT_KEY")
            .or_else(|_| env::var("GOOGLE_APPLICATION_CREDENTIALS"))
            .map(PathBuf::from)
            .map_err(|_| ConfigError::Missing("GEE_SERVICE_ACCOUNT_KEY"))?;

        let export_bucket = required("GEE_EXPORT_BUCKET")?;

        let model_path = env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("models/floor_detector.onnx"));

        let labels_path = env::var("MODEL_LABELS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_labels_path(&model_path));

        Ok(Self {
            service_account_key_path,
            export_bucket,
            project: optional("GEE_PROJECT"),
            port: parsed("PORT", 8000)?,
            model_path,
            labels_path,
            model_input_size: parsed("MODEL_INPUT_SIZE", 224)?,
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            gee_api_url: env::var("GEE_API_URL")
                .unwrap_or_else(|_| DEFAULT_GEE_API_URL.to_string()),
            gcs_api_url: env::var("GCS_API_URL")
                .unwrap_or_else(|_| DEFAULT_GCS_API_URL.to_string()),
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// `models/floor_detector.onnx` -> `models/floor_detector.labels.json`
pub fn default_labels_path(model_path: &std::path::Path) -> PathBuf {
    model_path.with_extension("labels.json")
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_labels_path_follows_model_path() {
        let labels = default_labels_path(Path::new("models/floor_detector.onnx"));
        assert_eq!(labels, PathBuf::from("models/floor_detector.labels.json"));
    }

    #[test]
    fn test_parsed_rejects_garbage() {
        // Unique name so parallel tests don't race on the environment.
        env::set_var("GEOVISION_TEST_PORT_GARBAGE", "eighty");
        let result: Result<u16, _> = parsed("GEOVISION_TEST_PORT_GARBAGE", 8000);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_parsed_uses_default_when_unset() {
        let port: u16 = parsed("GEOVISION_TEST_PORT_UNSET", 8000).unwrap();
        assert_eq!(port, 8000);
    }
}
