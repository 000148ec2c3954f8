//! Earth Engine request/response bodies

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Body of `POST /get_gee_map_layer`
#[derive(Debug, Deserialize, Validate)]
pub struct MapLayerRequest {
    #[serde(default)]
    pub layer_type: Option<String>,
    #[validate(required)]
    pub aoi_geojson: Option<Value>,
    #[validate(required, length(min = 1))]
    pub start_date: Option<String>,
    #[validate(required, length(min = 1))]
    pub end_date: Option<String>,
}

/// One renderable layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapLayer {
    /// Earth Engine map name, `projects/{project}/maps/{id}`
    pub mapid: String,
    /// Always empty with OAuth-authenticated tile requests; kept for older clients
    pub token: String,
    pub tile_url: String,
}

#[derive(Debug, Serialize)]
pub struct MapLayerResponse {
    pub layer_type: String,
    pub base_layer: MapLayer,
    pub highlight_layer: MapLayer,
    /// `{mapid}`, `{z}`, `{x}`, `{y}` placeholders
    pub tile_url_template: String,
}

/// Body of `POST /export_gee_image`
#[derive(Debug, Deserialize, Validate)]
pub struct ExportImageBody {
    #[serde(default)]
    pub layer_type: Option<String>,
    #[validate(required)]
    pub aoi_geojson: Option<Value>,
    #[validate(required, length(min = 1))]
    pub start_date: Option<String>,
    #[validate(required, length(min = 1))]
    pub end_date: Option<String>,
    #[serde(default)]
    pub file_name_prefix: Option<String>,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default)]
    pub file_format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportImageResponse {
    pub task_id: String,
    pub operation_name: String,
    pub state: String,
    pub bucket: String,
    pub file_name_prefix: String,
    pub destination: String,
    pub file_format: String,
    pub scale: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_dates_fail_validation() {
        let req: MapLayerRequest = serde_json::from_value(json!({
            "layer_type": "sentinel2",
            "aoi_geojson": { "type": "Point", "coordinates": [0.0, 0.0] }
        }))
        .unwrap();

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("start_date"));
        assert!(fields.contains_key("end_date"));
        assert!(!fields.contains_key("aoi_geojson"));
    }

    #[test]
    fn test_empty_date_fails_validation() {
        let req: ExportImageBody = serde_json::from_value(json!({
            "aoi_geojson": { "type": "Point", "coordinates": [0.0, 0.0] },
            "start_date": "",
            "end_date": "2024-02-01"
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }
}
