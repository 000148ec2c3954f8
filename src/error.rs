//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::classifier::ClassifierError;
use crate::google::auth::AuthError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    // Request errors
    #[error("{0}")]
    ValidationError(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    // Earth Engine errors
    #[error("Earth Engine error: {0}")]
    EarthEngineError(String),

    // Cloud Storage errors
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Storage client is not initialized")]
    StorageUnavailable,

    // Classifier errors
    #[error("Model is not loaded")]
    ModelUnavailable,

    #[error("Prediction failed: {0}")]
    InferenceError(String),

    // Generic errors
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::EarthEngineError(_)
            | AppError::StorageError(_)
            | AppError::ModelUnavailable
            | AppError::InferenceError(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::ValidationError(msg) | AppError::PayloadTooLarge(msg) => {
                tracing::debug!("Rejected request: {}", msg)
            }
            AppError::StorageUnavailable | AppError::ModelUnavailable => {
                tracing::warn!("{}", self)
            }
            _ => tracing::error!("{}", self),
        }

        // Upstream messages are passed through so callers can see what Earth Engine said.
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::EarthEngineError(err.to_string())
    }
}

impl From<ClassifierError> for AppError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::InvalidImage(msg) => AppError::ValidationError(msg),
            other => AppError::InferenceError(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort_unstable();
        AppError::ValidationError(format!("Missing required field(s): {}", fields.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::ValidationError("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::StorageUnavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            AppError::PayloadTooLarge("too big".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(AppError::ModelUnavailable.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::EarthEngineError("quota".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_message_is_kept() {
        let err = AppError::EarthEngineError("Collection.load: not found".into());
        assert!(err.to_string().contains("Collection.load: not found"));
    }

    #[test]
    fn test_invalid_image_maps_to_bad_request() {
        let err: AppError = ClassifierError::InvalidImage("not an image".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
