//! Cloud Storage client for the export bucket

use std::sync::Arc;

use serde::Deserialize;

use super::auth::TokenProvider;
use super::upstream_message;
use crate::{AppError, AppResult};

/// Bucket metadata returned by `GET /storage/v1/b/{bucket}`
#[derive(Debug, Clone, Deserialize)]
pub struct BucketInfo {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Handle on the bucket Earth Engine writes exports into.
///
/// Only constructed once the bucket has been confirmed reachable.
#[derive(Debug, Clone)]
pub struct StorageClient {
    bucket: BucketInfo,
}

impl StorageClient {
    /// Look up the bucket with the service account's credentials
    pub async fn connect(
        http: &reqwest::Client,
        tokens: &Arc<TokenProvider>,
        base_url: &str,
        bucket: &str,
    ) -> AppResult<Self> {
        let token = tokens
            .access_token()
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;
        let url = format!("{}/storage/v1/b/{}", base_url.trim_end_matches('/'), bucket);

        let response = http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StorageError(format!(
                "bucket '{}': {}",
                bucket,
                upstream_message(status, &body)
            )));
        }

        let info: BucketInfo = response
            .json()
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;

        tracing::info!(
            "Export bucket ready: {} ({})",
            info.name,
            info.location.as_deref().unwrap_or("unknown location")
        );

        Ok(Self { bucket: info })
    }

    /// Client for a bucket that is assumed to exist
    pub fn from_bucket_name(bucket: impl Into<String>) -> Self {
        Self {
            bucket: BucketInfo {
                name: bucket.into(),
                location: None,
            },
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket.name
    }

    /// `gs://` URI prefix an export with this file prefix will land under
    pub fn destination_uri(&self, file_name_prefix: &str) -> String {
        format!("gs://{}/{}", self.bucket.name, file_name_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_uri() {
        let storage = StorageClient::from_bucket_name("ndvi-exports");
        assert_eq!(storage.destination_uri("aoi_2024"), "gs://ndvi-exports/aoi_2024");
    }

    #[test]
    fn test_bucket_metadata_parsing() {
        let info: BucketInfo = serde_json::from_str(
            r#"{"kind":"storage#bucket","name":"ndvi-exports","location":"US","storageClass":"STANDARD"}"#,
        )
        .unwrap();
        assert_eq!(info.name, "ndvi-exports");
        assert_eq!(info.location.as_deref(), Some("US"));
    }
}
