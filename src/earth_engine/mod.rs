//! Earth Engine proxy: expression building, imagery pipelines, REST client

pub mod client;
pub mod expression;
pub mod geometry;
pub mod layers;
pub mod types;

pub use client::{EarthEngine, RestEarthEngine};
pub use geometry::AoiGeometry;
pub use layers::{ImageryQuery, LayerType};
pub use types::{EarthEngineMap, ExportFormat, ExportImageRequest, MapRequest, Operation};
