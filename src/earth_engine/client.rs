//! Earth Engine REST client

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use super::types::{EarthEngineMap, ExportImageRequest, MapRequest, Operation};
use crate::google::auth::TokenProvider;
use crate::google::upstream_message;
use crate::{AppError, AppResult};

/// Operations the API needs from Earth Engine
#[async_trait]
pub trait EarthEngine: Send + Sync {
    /// Cloud project the requests are billed to
    fn project(&self) -> &str;

    /// Base URL tiles are served from
    fn api_url(&self) -> &str;

    /// Register a visualized image and get back its map name
    async fn create_map(&self, request: &MapRequest) -> AppResult<EarthEngineMap>;

    /// Start a batch export; returns the long-running operation
    async fn export_image(&self, request: &ExportImageRequest) -> AppResult<Operation>;

    /// XYZ tile template for a map returned by [`EarthEngine::create_map`]
    fn tile_url(&self, map_name: &str) -> String {
        format!(
            "{}/v1/{}/tiles/{{z}}/{{x}}/{{y}}",
            self.api_url().trim_end_matches('/'),
            map_name
        )
    }
}

/// [`EarthEngine`] over `earthengine.googleapis.com/v1`
pub struct RestEarthEngine {
    http: reqwest::Client,
    tokens: Arc<TokenProvider>,
    base_url: String,
    project: String,
}

impl RestEarthEngine {
    pub fn new(
        http: reqwest::Client,
        tokens: Arc<TokenProvider>,
        base_url: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            http,
            tokens,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project: project.into(),
        }
    }

    fn project_url(&self, suffix: &str) -> String {
        format!("{}/v1/projects/{}/{}", self.base_url, self.project, suffix)
    }

    async fn post<B, R>(&self, url: String, body: &B) -> AppResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::EarthEngineError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::EarthEngineError(upstream_message(status, &body)));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| AppError::EarthEngineError(format!("Unexpected response: {}", e)))
    }
}

#[async_trait]
impl EarthEngine for RestEarthEngine {
    fn project(&self) -> &str {
        &self.project
    }

    fn api_url(&self) -> &str {
        &self.base_url
    }

    async fn create_map(&self, request: &MapRequest) -> AppResult<EarthEngineMap> {
        let map: EarthEngineMap = self.post(self.project_url("maps"), request).await?;
        tracing::debug!("Map created: {}", map.name);
        Ok(map)
    }

    async fn export_image(&self, request: &ExportImageRequest) -> AppResult<Operation> {
        let operation: Operation = self.post(self.project_url("image:export"), request).await?;
        tracing::info!(
            "Export started: {} ({})",
            operation.name,
            request.file_export_options.cloud_storage_destination.filename_prefix
        );
        Ok(operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::auth::{test_key_json, ServiceAccountKey};

    fn client() -> RestEarthEngine {
        let key = ServiceAccountKey::from_json(&test_key_json("geo")).unwrap();
        let http = reqwest::Client::new();
        let tokens = Arc::new(TokenProvider::new(key, http.clone()));
        RestEarthEngine::new(http, tokens, "https://earthengine.googleapis.com/", "geo")
    }

    #[test]
    fn test_project_urls() {
        let ee = client();
        assert_eq!(
            ee.project_url("image:export"),
            "https://earthengine.googleapis.com/v1/projects/geo/image:export"
        );
    }

    #[test]
    fn test_tile_url_template() {
        let ee = client();
        assert_eq!(
            ee.tile_url("projects/geo/maps/abc123"),
            "https://earthengine.googleapis.com/v1/projects/geo/maps/abc123/tiles/{z}/{x}/{y}"
        );
    }
}
