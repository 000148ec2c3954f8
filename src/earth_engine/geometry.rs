//! AOI parsing
//!
//! Accepts a GeoJSON Geometry, a Feature, or a FeatureCollection with exactly
//! one feature, either inline or as a JSON-encoded string.

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::expression::ValueNode;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("aoi_geojson is not valid GeoJSON: {0}")]
    Malformed(String),

    #[error("aoi_geojson FeatureCollection must contain exactly one feature, found {0}")]
    FeatureCount(usize),

    #[error("aoi_geojson Feature has no geometry")]
    MissingGeometry,

    #[error("aoi_geojson {0}")]
    InvalidCoordinates(String),
}

pub type Position = [f64; 2];

#[derive(Debug, Clone, PartialEq)]
pub enum AoiGeometry {
    Point(Position),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeoJson {
    Point {
        coordinates: Vec<f64>,
    },
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    Feature {
        geometry: Option<Box<GeoJson>>,
    },
    FeatureCollection {
        features: Vec<GeoJson>,
    },
}

impl AoiGeometry {
    pub fn parse(value: &Value) -> Result<Self, GeometryError> {
        // Some clients send the GeoJSON pre-stringified.
        let owned;
        let value = match value {
            Value::String(raw) => {
                owned = serde_json::from_str::<Value>(raw)
                    .map_err(|e| GeometryError::Malformed(e.to_string()))?;
                &owned
            }
            other => other,
        };

        let parsed = GeoJson::deserialize(value)
            .map_err(|e| GeometryError::Malformed(e.to_string()))?;
        Self::from_geojson(parsed)
    }

    fn from_geojson(geojson: GeoJson) -> Result<Self, GeometryError> {
        match geojson {
            GeoJson::Point { coordinates } => Ok(AoiGeometry::Point(position(&coordinates)?)),
            GeoJson::Polygon { coordinates } => Ok(AoiGeometry::Polygon(polygon(&coordinates)?)),
            GeoJson::MultiPolygon { coordinates } => {
                if coordinates.is_empty() {
                    return Err(GeometryError::InvalidCoordinates(
                        "MultiPolygon has no polygons".to_string(),
                    ));
                }
                let polygons = coordinates
                    .iter()
                    .map(|p| polygon(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(AoiGeometry::MultiPolygon(polygons))
            }
            GeoJson::Feature { geometry } => match geometry {
                Some(inner) => Self::from_geojson(*inner),
                None => Err(GeometryError::MissingGeometry),
            },
            GeoJson::FeatureCollection { mut features } => {
                if features.len() != 1 {
                    return Err(GeometryError::FeatureCount(features.len()));
                }
                Self::from_geojson(features.remove(0))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AoiGeometry::Point(_) => "Point",
            AoiGeometry::Polygon(_) => "Polygon",
            AoiGeometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// `GeometryConstructors.*` invocation for use inside an expression
    pub fn to_node(&self) -> ValueNode {
        match self {
            AoiGeometry::Point(p) => ValueNode::invoke(
                "GeometryConstructors.Point",
                [("coordinates", ValueNode::constant(json!(p)))],
            ),
            AoiGeometry::Polygon(rings) => ValueNode::invoke(
                "GeometryConstructors.Polygon",
                [
                    ("coordinates", ValueNode::constant(json!(rings))),
                    ("evenOdd", ValueNode::constant(true)),
                ],
            ),
            AoiGeometry::MultiPolygon(polygons) => ValueNode::invoke(
                "GeometryConstructors.MultiPolygon",
                [
                    ("coordinates", ValueNode::constant(json!(polygons))),
                    ("evenOdd", ValueNode::constant(true)),
                ],
            ),
        }
    }
}

fn position(raw: &[f64]) -> Result<Position, GeometryError> {
    if raw.len() < 2 {
        return Err(GeometryError::InvalidCoordinates(format!(
            "position needs [lon, lat], got {} value(s)",
            raw.len()
        )));
    }
    let (lon, lat) = (raw[0], raw[1]);
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(GeometryError::InvalidCoordinates(format!(
            "position [{}, {}] is outside lon/lat bounds",
            lon, lat
        )));
    }
    Ok([lon, lat])
}

fn polygon(raw: &[Vec<Vec<f64>>]) -> Result<Vec<Vec<Position>>, GeometryError> {
    if raw.is_empty() {
        return Err(GeometryError::InvalidCoordinates(
            "Polygon has no rings".to_string(),
        ));
    }

    raw.iter()
        .map(|ring| {
            let ring = ring
                .iter()
                .map(|p| position(p))
                .collect::<Result<Vec<_>, _>>()?;
            // Closed ring: at least three distinct vertices plus the closing one.
            if ring.len() < 4 || ring.first() != ring.last() {
                return Err(GeometryError::InvalidCoordinates(
                    "Polygon rings must be closed with at least 4 positions".to_string(),
                ));
            }
            Ok(ring)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[30.0, 10.0], [31.0, 10.0], [31.0, 11.0], [30.0, 11.0], [30.0, 10.0]]]
        })
    }

    #[test]
    fn test_parse_polygon() {
        let geometry = AoiGeometry::parse(&square()).unwrap();
        match geometry {
            AoiGeometry::Polygon(rings) => {
                assert_eq!(rings.len(), 1);
                assert_eq!(rings[0].len(), 5);
            }
            other => panic!("Expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_unwraps_single_feature_collection() {
        let fc = json!({
            "type": "FeatureCollection",
            "features": [{ "type": "Feature", "properties": {}, "geometry": square() }]
        });
        assert_eq!(AoiGeometry::parse(&fc).unwrap().kind(), "Polygon");
    }

    #[test]
    fn test_accepts_stringified_geojson() {
        let raw = Value::String(square().to_string());
        assert_eq!(AoiGeometry::parse(&raw).unwrap().kind(), "Polygon");
    }

    #[test]
    fn test_rejects_open_ring() {
        let open = json!({
            "type": "Polygon",
            "coordinates": [[[30.0, 10.0], [31.0, 10.0], [31.0, 11.0], [30.0, 11.0]]]
        });
        assert!(matches!(
            AoiGeometry::parse(&open),
            Err(GeometryError::InvalidCoordinates(_))
        ));
    }

    #[test]
    fn test_rejects_multi_feature_collection() {
        let fc = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": square() },
                { "type": "Feature", "geometry": square() }
            ]
        });
        assert_eq!(AoiGeometry::parse(&fc), Err(GeometryError::FeatureCount(2)));
    }

    #[test]
    fn test_rejects_out_of_range_latitude() {
        let point = json!({ "type": "Point", "coordinates": [10.0, 95.0] });
        assert!(AoiGeometry::parse(&point).is_err());
    }

    #[test]
    fn test_polygon_node() {
        let node = AoiGeometry::parse(&square()).unwrap().to_node();
        assert_eq!(node.function_name(), Some("GeometryConstructors.Polygon"));
        assert_eq!(node.argument("evenOdd"), Some(&ValueNode::constant(true)));
    }
}
