//! Floor classifier handler

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};

use crate::classifier::Prediction;
use crate::{AppError, AppResult, AppState};

/// Multipart field carrying the image
pub const FILE_FIELD: &str = "file";

/// `POST /predict/` - multipart upload of one image
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<Prediction>> {
    // A failed model load disables this route regardless of the request.
    let classifier = state.classifier.clone().ok_or(AppError::ModelUnavailable)?;

    let multipart = multipart.map_err(|e| upload_error(e.status(), e.body_text()))?;
    let (file_name, image) = read_upload(multipart).await?;

    tracing::debug!(
        "Classifying upload {} ({} bytes)",
        file_name.as_deref().unwrap_or("<unnamed>"),
        image.len()
    );

    let prediction = tokio::task::spawn_blocking(move || classifier.classify(&image))
        .await
        .map_err(|e| AppError::InternalError(format!("Prediction task failed: {}", e)))??;

    Ok(Json(prediction))
}

/// The `file` field, or failing that the first non-empty field
async fn read_upload(mut multipart: Multipart) -> AppResult<(Option<String>, Bytes)> {
    let mut fallback: Option<(Option<String>, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        let is_file_field = field.name() == Some(FILE_FIELD);
        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(multipart_error)?;

        if is_file_field {
            if data.is_empty() {
                return Err(AppError::ValidationError("Uploaded file is empty".to_string()));
            }
            return Ok((file_name, data));
        }
        if fallback.is_none() && !data.is_empty() {
            fallback = Some((file_name, data));
        }
    }

    fallback.ok_or_else(|| {
        AppError::ValidationError(format!("Expected an image in the '{}' field", FILE_FIELD))
    })
}

fn multipart_error(e: MultipartError) -> AppError {
    upload_error(e.status(), e.body_text())
}

/// Oversized bodies keep their 413; every other upload problem is a 400
fn upload_error(status: StatusCode, message: String) -> AppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(message)
    } else {
        AppError::ValidationError(message)
    }
}
