//! Earth Engine computation graphs
//!
//! The REST API takes an `Expression`: a map of named value nodes plus the
//! name of the node holding the result. Everything here is built as a single
//! nested tree stored under `"0"`, which the API accepts without references.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Key the root node is stored under
const ROOT: &str = "0";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub result: String,
    pub values: BTreeMap<String, ValueNode>,
}

impl Expression {
    pub fn new(root: ValueNode) -> Self {
        let mut values = BTreeMap::new();
        values.insert(ROOT.to_string(), root);
        Self {
            result: ROOT.to_string(),
            values,
        }
    }

    pub fn root(&self) -> Option<&ValueNode> {
        self.values.get(&self.result)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ValueNode {
    #[serde(rename = "constantValue")]
    Constant(Value),

    #[serde(rename = "functionInvocationValue")]
    Invocation(FunctionInvocation),

    #[serde(rename = "arrayValue")]
    Array(ArrayValue),

    #[serde(rename = "dictionaryValue")]
    Dictionary(DictionaryValue),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInvocation {
    pub function_name: String,
    pub arguments: BTreeMap<String, ValueNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayValue {
    pub values: Vec<ValueNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DictionaryValue {
    pub values: BTreeMap<String, ValueNode>,
}

impl ValueNode {
    pub fn constant(value: impl Into<Value>) -> Self {
        ValueNode::Constant(value.into())
    }

    pub fn array(values: Vec<ValueNode>) -> Self {
        ValueNode::Array(ArrayValue { values })
    }

    pub fn strings<S: AsRef<str>>(items: &[S]) -> Self {
        ValueNode::array(items.iter().map(|s| ValueNode::constant(s.as_ref())).collect())
    }

    pub fn invoke<I>(function_name: &str, arguments: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, ValueNode)>,
    {
        ValueNode::Invocation(FunctionInvocation {
            function_name: function_name.to_string(),
            arguments: arguments
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        })
    }

    /// Function name when this node is an invocation
    pub fn function_name(&self) -> Option<&str> {
        match self {
            ValueNode::Invocation(call) => Some(&call.function_name),
            _ => None,
        }
    }

    pub fn argument(&self, name: &str) -> Option<&ValueNode> {
        match self {
            ValueNode::Invocation(call) => call.arguments.get(name),
            _ => None,
        }
    }
}

// ----------------------------------------------------------------------------
// Algorithms used by the map and export pipelines
// ----------------------------------------------------------------------------

pub fn image_collection_load(id: &str) -> ValueNode {
    ValueNode::invoke("ImageCollection.load", [("id", ValueNode::constant(id))])
}

pub fn date(value: &str) -> ValueNode {
    ValueNode::invoke("Date", [("value", ValueNode::constant(value))])
}

pub fn filter_bounds(collection: ValueNode, geometry: ValueNode) -> ValueNode {
    let filter = ValueNode::invoke(
        "Filter.intersects",
        [
            ("leftField", ValueNode::constant(".all")),
            ("rightValue", geometry),
        ],
    );
    collection_filter(collection, filter)
}

/// Half-open `[start, end)` on `system:time_start`
pub fn filter_date(collection: ValueNode, start: &str, end: &str) -> ValueNode {
    let range = ValueNode::invoke("DateRange", [("start", date(start)), ("end", date(end))]);
    let filter = ValueNode::invoke(
        "Filter.dateRangeContains",
        [
            ("leftValue", range),
            ("rightField", ValueNode::constant("system:time_start")),
        ],
    );
    collection_filter(collection, filter)
}

pub fn filter_less_than(collection: ValueNode, property: &str, value: f64) -> ValueNode {
    let filter = ValueNode::invoke(
        "Filter.lessThan",
        [
            ("leftField", ValueNode::constant(property)),
            ("rightValue", ValueNode::constant(value)),
        ],
    );
    collection_filter(collection, filter)
}

fn collection_filter(collection: ValueNode, filter: ValueNode) -> ValueNode {
    ValueNode::invoke(
        "Collection.filter",
        [("collection", collection), ("filter", filter)],
    )
}

/// Per-pixel median composite; keeps the input band names
pub fn median(collection: ValueNode) -> ValueNode {
    ValueNode::invoke("reduce.median", [("collection", collection)])
}

pub fn clip(image: ValueNode, geometry: ValueNode) -> ValueNode {
    ValueNode::invoke("Image.clip", [("input", image), ("geometry", geometry)])
}

pub fn select<S: AsRef<str>>(image: ValueNode, bands: &[S]) -> ValueNode {
    ValueNode::invoke(
        "Image.select",
        [("input", image), ("bandSelectors", ValueNode::strings(bands))],
    )
}

pub fn rename<S: AsRef<str>>(image: ValueNode, names: &[S]) -> ValueNode {
    ValueNode::invoke(
        "Image.rename",
        [("input", image), ("names", ValueNode::strings(names))],
    )
}

/// `(first - second) / (first + second)`
pub fn normalized_difference(image: ValueNode, first: &str, second: &str) -> ValueNode {
    ValueNode::invoke(
        "Image.normalizedDifference",
        [("input", image), ("bandNames", ValueNode::strings(&[first, second]))],
    )
}

pub fn image_constant(value: f64) -> ValueNode {
    ValueNode::invoke("Image.constant", [("value", ValueNode::constant(value))])
}

pub fn greater_than(image: ValueNode, threshold: f64) -> ValueNode {
    ValueNode::invoke(
        "Image.gt",
        [("image1", image), ("image2", image_constant(threshold))],
    )
}

pub fn update_mask(image: ValueNode, mask: ValueNode) -> ValueNode {
    ValueNode::invoke("Image.updateMask", [("image", image), ("mask", mask)])
}

pub fn clip_to_bounds_and_scale(image: ValueNode, geometry: ValueNode, scale: f64) -> ValueNode {
    ValueNode::invoke(
        "Image.clipToBoundsAndScale",
        [
            ("input", image),
            ("geometry", geometry),
            ("scale", ValueNode::constant(scale)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expression_wire_format() {
        let expr = Expression::new(image_collection_load("COPERNICUS/S2_SR_HARMONIZED"));
        let wire = serde_json::to_value(&expr).unwrap();

        assert_eq!(
            wire,
            json!({
                "result": "0",
                "values": {
                    "0": {
                        "functionInvocationValue": {
                            "functionName": "ImageCollection.load",
                            "arguments": {
                                "id": { "constantValue": "COPERNICUS/S2_SR_HARMONIZED" }
                            }
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_band_lists_serialize_as_array_values() {
        let node = normalized_difference(image_collection_load("x"), "B8", "B4");
        let bands = serde_json::to_value(node.argument("bandNames").unwrap()).unwrap();
        assert_eq!(
            bands,
            json!({ "arrayValue": { "values": [
                { "constantValue": "B8" },
                { "constantValue": "B4" }
            ]}})
        );
    }

    #[test]
    fn test_date_filter_targets_time_start() {
        let node = filter_date(image_collection_load("x"), "2024-01-01", "2024-02-01");
        assert_eq!(node.function_name(), Some("Collection.filter"));

        let filter = node.argument("filter").unwrap();
        assert_eq!(filter.function_name(), Some("Filter.dateRangeContains"));
        assert_eq!(
            filter.argument("rightField"),
            Some(&ValueNode::constant("system:time_start"))
        );

        let range = filter.argument("leftValue").unwrap();
        let start = range.argument("start").unwrap();
        assert_eq!(start.argument("value"), Some(&ValueNode::constant("2024-01-01")));
    }

    #[test]
    fn test_threshold_is_promoted_to_image() {
        let node = greater_than(image_collection_load("x"), 0.3);
        let rhs = node.argument("image2").unwrap();
        assert_eq!(rhs.function_name(), Some("Image.constant"));
    }
}
