//! Imagery pipelines
//!
//! Every request builds the same composite: load the sensor collection,
//! restrict it to the AOI and date window, drop cloudy scenes, take the
//! per-pixel median, and clip to the AOI. The base layer is true colour; the
//! highlight layer is NDVI masked to vegetated pixels.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use super::expression::{self as ee, Expression, ValueNode};
use super::geometry::AoiGeometry;
use super::types::{
    CloudStorageDestination, DoubleRange, ExportFormat, ExportImageRequest,
    ImageFileExportOptions, MapRequest, VisualizationOptions,
};

/// NDVI above this counts as vegetation in the highlight layer
pub const NDVI_THRESHOLD: f64 = 0.3;

/// Yellow to dark green
pub const NDVI_PALETTE: [&str; 3] = ["ffffcc", "78c679", "006837"];

/// Scenes with more cloud cover than this (percent) are dropped
pub const MAX_CLOUD_PERCENT: f64 = 20.0;

pub const DEFAULT_MAX_PIXELS: &str = "10000000000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerType {
    #[default]
    Sentinel2,
    Landsat8,
}

/// Collection and band layout for one sensor
#[derive(Debug, Clone, Copy)]
pub struct SensorProfile {
    pub collection_id: &'static str,
    pub cloud_property: &'static str,
    pub rgb_bands: [&'static str; 3],
    pub rgb_range: DoubleRange,
    pub nir_band: &'static str,
    pub red_band: &'static str,
    /// Native resolution in meters
    pub native_scale: f64,
}

const SENTINEL2: SensorProfile = SensorProfile {
    collection_id: "COPERNICUS/S2_SR_HARMONIZED",
    cloud_property: "CLOUDY_PIXEL_PERCENTAGE",
    rgb_bands: ["B4", "B3", "B2"],
    rgb_range: DoubleRange { min: 0.0, max: 3000.0 },
    nir_band: "B8",
    red_band: "B4",
    native_scale: 10.0,
};

const LANDSAT8: SensorProfile = SensorProfile {
    collection_id: "LANDSAT/LC08/C02/T1_L2",
    cloud_property: "CLOUD_COVER",
    rgb_bands: ["SR_B4", "SR_B3", "SR_B2"],
    rgb_range: DoubleRange { min: 7000.0, max: 30000.0 },
    nir_band: "SR_B5",
    red_band: "SR_B4",
    native_scale: 30.0,
};

impl LayerType {
    pub fn profile(&self) -> &'static SensorProfile {
        match self {
            LayerType::Sentinel2 => &SENTINEL2,
            LayerType::Landsat8 => &LANDSAT8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerType::Sentinel2 => "sentinel2",
            LayerType::Landsat8 => "landsat8",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "sentinel2" | "sentinel-2" | "s2" | "ndvi" => Ok(LayerType::Sentinel2),
            "landsat8" | "landsat-8" | "l8" => Ok(LayerType::Landsat8),
            other => Err(format!(
                "Unknown layer_type '{}'; expected sentinel2 or landsat8",
                other
            )),
        }
    }
}

/// Validated AOI + date window for one sensor
#[derive(Debug, Clone)]
pub struct ImageryQuery {
    pub layer_type: LayerType,
    pub aoi: AoiGeometry,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ImageryQuery {
    pub fn new(
        layer_type: LayerType,
        aoi: AoiGeometry,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, String> {
        if start_date >= end_date {
            return Err(format!(
                "start_date ({}) must be before end_date ({})",
                start_date, end_date
            ));
        }
        Ok(Self {
            layer_type,
            aoi,
            start_date,
            end_date,
        })
    }

    /// Cloud-filtered median composite clipped to the AOI
    pub fn composite(&self) -> ValueNode {
        let profile = self.layer_type.profile();
        let geometry = self.aoi.to_node();

        let collection = ee::image_collection_load(profile.collection_id);
        let collection = ee::filter_bounds(collection, geometry.clone());
        let collection = ee::filter_date(
            collection,
            &self.start_date.format("%Y-%m-%d").to_string(),
            &self.end_date.format("%Y-%m-%d").to_string(),
        );
        let collection =
            ee::filter_less_than(collection, profile.cloud_property, MAX_CLOUD_PERCENT);

        ee::clip(ee::median(collection), geometry)
    }

    /// Single band image named `NDVI`
    pub fn ndvi(&self) -> ValueNode {
        let profile = self.layer_type.profile();
        let ndvi = ee::normalized_difference(self.composite(), profile.nir_band, profile.red_band);
        ee::rename(ndvi, &["NDVI"])
    }

    pub fn base_map(&self) -> MapRequest {
        let profile = self.layer_type.profile();
        MapRequest {
            expression: Expression::new(ee::select(self.composite(), &profile.rgb_bands)),
            file_format: "AUTO_JPEG_PNG",
            visualization_options: VisualizationOptions {
                ranges: vec![profile.rgb_range],
                palette_colors: Vec::new(),
            },
        }
    }

    /// NDVI shown only where it exceeds [`NDVI_THRESHOLD`]
    pub fn highlight_map(&self) -> MapRequest {
        let ndvi = self.ndvi();
        let mask = ee::greater_than(ndvi.clone(), NDVI_THRESHOLD);

        MapRequest {
            expression: Expression::new(ee::update_mask(ndvi, mask)),
            file_format: "PNG",
            visualization_options: VisualizationOptions {
                ranges: vec![DoubleRange { min: NDVI_THRESHOLD, max: 1.0 }],
                palette_colors: NDVI_PALETTE.iter().map(|c| c.to_string()).collect(),
            },
        }
    }

    /// Export of the NDVI band into the given bucket
    pub fn export_request(
        &self,
        bucket: &str,
        file_name_prefix: &str,
        scale: f64,
        file_format: ExportFormat,
        request_id: String,
    ) -> ExportImageRequest {
        let image = ee::clip_to_bounds_and_scale(self.ndvi(), self.aoi.to_node(), scale);

        ExportImageRequest {
            expression: Expression::new(image),
            description: export_description(file_name_prefix),
            file_export_options: ImageFileExportOptions {
                file_format,
                cloud_storage_destination: CloudStorageDestination {
                    bucket: bucket.to_string(),
                    filename_prefix: file_name_prefix.to_string(),
                },
            },
            max_pixels: DEFAULT_MAX_PIXELS.to_string(),
            request_id,
        }
    }
}

/// Task descriptions only allow letters, digits, `.`, `,`, `:`, `;`, `_` and `-`, max 100 chars
pub fn export_description(file_name_prefix: &str) -> String {
    let cleaned: String = file_name_prefix
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || ".,:;_-".contains(c) {
                c
            } else {
                '_'
            }
        })
        .take(100)
        .collect();

    if cleaned.is_empty() {
        "gee_export".to_string()
    } else {
        cleaned
    }
}
