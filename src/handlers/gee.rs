//! Earth Engine proxy handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::earth_engine::{AoiGeometry, EarthEngineMap, ExportFormat, ImageryQuery, LayerType};
use crate::models::{
    ExportImageBody, ExportImageResponse, MapLayer, MapLayerRequest, MapLayerResponse,
};
use crate::{AppError, AppResult, AppState};

pub const DEFAULT_FILE_NAME_PREFIX: &str = "gee_export";

/// Base true-colour layer plus NDVI highlight for an AOI and date window
pub async fn get_map_layer(
    State(state): State<AppState>,
    payload: Result<Json<MapLayerRequest>, JsonRejection>,
) -> AppResult<Json<MapLayerResponse>> {
    let Json(req) = payload.map_err(bad_body)?;
    req.validate()?;

    let query = imagery_query(
        req.layer_type.as_deref(),
        req.aoi_geojson.as_ref(),
        req.start_date.as_deref(),
        req.end_date.as_deref(),
    )?;

    let base_request = query.base_map();
    let highlight_request = query.highlight_map();

    let ee = state.earth_engine.as_ref();
    let (base, highlight) = tokio::try_join!(
        ee.create_map(&base_request),
        ee.create_map(&highlight_request),
    )?;

    tracing::info!(
        "Map layers created for {} {} ({} to {})",
        query.layer_type,
        query.aoi.kind(),
        query.start_date,
        query.end_date
    );

    Ok(Json(MapLayerResponse {
        layer_type: query.layer_type.to_string(),
        base_layer: map_layer(&state, base),
        highlight_layer: map_layer(&state, highlight),
        tile_url_template: state.earth_engine.tile_url("{mapid}"),
    }))
}

/// Start an NDVI export into the configured bucket
pub async fn export_image(
    State(state): State<AppState>,
    payload: Result<Json<ExportImageBody>, JsonRejection>,
) -> AppResult<Json<ExportImageResponse>> {
    let Json(req) = payload.map_err(bad_body)?;
    req.validate()?;

    let query = imagery_query(
        req.layer_type.as_deref(),
        req.aoi_geojson.as_ref(),
        req.start_date.as_deref(),
        req.end_date.as_deref(),
    )?;

    let file_format = match req.file_format.as_deref() {
        Some(format) => format.parse::<ExportFormat>().map_err(AppError::ValidationError)?,
        None => ExportFormat::default(),
    };

    // Defaults to the sensor's native resolution
    let scale = req.scale.unwrap_or(query.layer_type.profile().native_scale);
    if !scale.is_finite() || scale <= 0.0 {
        return Err(AppError::ValidationError(format!(
            "scale must be a positive number of meters, got {}",
            scale
        )));
    }

    let file_name_prefix = req
        .file_name_prefix
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_NAME_PREFIX.to_string());

    let storage = state.storage.as_ref().ok_or(AppError::StorageUnavailable)?;

    let request = query.export_request(
        storage.bucket(),
        &file_name_prefix,
        scale,
        file_format,
        Uuid::new_v4().to_string(),
    );
    let operation = state.earth_engine.export_image(&request).await?;

    Ok(Json(ExportImageResponse {
        task_id: operation.task_id().to_string(),
        operation_name: operation.name.clone(),
        state: operation.state().to_string(),
        bucket: storage.bucket().to_string(),
        destination: storage.destination_uri(&file_name_prefix),
        file_name_prefix,
        file_format: file_format.label().to_string(),
        scale,
    }))
}

fn map_layer(state: &AppState, map: EarthEngineMap) -> MapLayer {
    MapLayer {
        tile_url: state.earth_engine.tile_url(&map.name),
        mapid: map.name,
        token: String::new(),
    }
}

/// Field presence is checked by `validate` before this runs.
fn imagery_query(
    layer_type: Option<&str>,
    aoi_geojson: Option<&Value>,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> AppResult<ImageryQuery> {
    let layer_type = layer_type
        .unwrap_or_default()
        .parse::<LayerType>()
        .map_err(AppError::ValidationError)?;

    let aoi = aoi_geojson
        .ok_or_else(|| AppError::ValidationError("aoi_geojson is required".to_string()))
        .and_then(|v| AoiGeometry::parse(v).map_err(|e| AppError::ValidationError(e.to_string())))?;

    let start = parse_date("start_date", start_date)?;
    let end = parse_date("end_date", end_date)?;

    ImageryQuery::new(layer_type, aoi, start, end).map_err(AppError::ValidationError)
}

/// `YYYY-MM-DD`, or an RFC 3339 timestamp whose date part is used
pub fn parse_date(field: &str, value: Option<&str>) -> AppResult<NaiveDate> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::ValidationError(format!("{} is required", field)))?;

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| {
            AppError::ValidationError(format!("{} must be a date (YYYY-MM-DD), got '{}'", field, raw))
        })
}

fn bad_body(rejection: JsonRejection) -> AppError {
    AppError::ValidationError(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("start_date", Some("2024-03-15")).unwrap(), expected);
        assert_eq!(
            parse_date("start_date", Some("2024-03-15T08:30:00Z")).unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(matches!(
            parse_date("end_date", Some("15/03/2024")),
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            parse_date("end_date", None),
            Err(AppError::ValidationError(_))
        ));
    }
}
