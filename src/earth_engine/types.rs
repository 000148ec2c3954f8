//! Earth Engine REST request/response bodies

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::expression::Expression;

/// Body of `POST v1/projects/{project}/maps`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRequest {
    pub expression: Expression,
    pub file_format: &'static str,
    pub visualization_options: VisualizationOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationOptions {
    pub ranges: Vec<DoubleRange>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub palette_colors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DoubleRange {
    pub min: f64,
    pub max: f64,
}

/// Response of the maps endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct EarthEngineMap {
    /// `projects/{project}/maps/{id}`
    pub name: String,
}

/// Body of `POST v1/projects/{project}/image:export`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportImageRequest {
    pub expression: Expression,
    pub description: String,
    pub file_export_options: ImageFileExportOptions,
    /// int64 travels as a string in the REST API
    pub max_pixels: String,
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFileExportOptions {
    pub file_format: ExportFormat,
    pub cloud_storage_destination: CloudStorageDestination,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudStorageDestination {
    pub bucket: String,
    pub filename_prefix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ExportFormat {
    #[default]
    #[serde(rename = "GEO_TIFF")]
    GeoTiff,
    #[serde(rename = "TF_RECORD_IMAGE")]
    TfRecord,
}

impl ExportFormat {
    /// Name clients use in requests and see in responses
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::GeoTiff => "GeoTIFF",
            ExportFormat::TfRecord => "TFRecord",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "geotiff" | "geo_tiff" | "tif" | "tiff" => Ok(ExportFormat::GeoTiff),
            "tfrecord" | "tf_record" | "tf_record_image" => Ok(ExportFormat::TfRecord),
            other => Err(format!(
                "Unsupported file_format '{}'; expected GeoTIFF or TFRecord",
                other
            )),
        }
    }
}

/// Long-running operation returned by the export endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    /// `projects/{project}/operations/{task_id}`
    pub name: String,
    #[serde(default)]
    pub metadata: Option<OperationMetadata>,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationMetadata {
    #[serde(default)]
    pub state: Option<String>,
}

impl Operation {
    /// Task id as the Earth Engine task list shows it
    pub fn task_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    pub fn state(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.state.as_deref())
            .unwrap_or(if self.done { "SUCCEEDED" } else { "PENDING" })
    }
}
