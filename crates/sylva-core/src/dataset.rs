//! Dataset shapes and loading
//!
//! The upstream transform stage supplies a mapping from dataset name to one
//! of two shapes: a flat record (named scalar/array fields, used by grid,
//! chart and gauge plugins) or a GeoJSON-like feature collection (used by
//! map plugins). Values are passed through as-is; only presence and shape
//! are enforced downstream, the plugin owns numeric/formatting semantics.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The two dataset shapes a plugin can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataShape {
    /// Flat record: object with named scalar/array fields.
    Record,
    /// GeoJSON-like collection of features with geometry and properties.
    Features,
}

impl fmt::Display for DataShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataShape::Record => write!(f, "record"),
            DataShape::Features => write!(f, "features"),
        }
    }
}

/// One feature of a geometry collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Value,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// A named dataset produced by the upstream transform stage.
#[derive(Debug, Clone)]
pub enum Dataset {
    Record(Map<String, Value>),
    Features(Vec<Feature>),
}

impl Dataset {
    pub fn shape(&self) -> DataShape {
        match self {
            Dataset::Record(_) => DataShape::Record,
            Dataset::Features(_) => DataShape::Features,
        }
    }

    /// Shape detection: an object carrying a `features` array is a geometry
    /// collection, any other object is a flat record.
    pub fn from_value(name: &str, value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            bail!("dataset '{name}' must be a JSON object");
        };

        match map.remove("features") {
            Some(Value::Array(items)) => {
                let features = items
                    .into_iter()
                    .map(serde_json::from_value)
                    .collect::<Result<Vec<Feature>, _>>()
                    .with_context(|| format!("dataset '{name}' has a malformed feature"))?;
                Ok(Dataset::Features(features))
            }
            Some(other) => {
                bail!(
                    "dataset '{name}' has a 'features' key that is not an array (found {})",
                    json_type_name(&other)
                );
            }
            None => Ok(Dataset::Record(map)),
        }
    }
}

/// Mapping from dataset name to dataset, ordered for deterministic reports.
pub type DatasetMap = BTreeMap<String, Dataset>;

/// Load a dataset mapping from a JSON file.
///
/// Failure here is fatal to the whole run (collaborator-level concern), so
/// errors carry `anyhow` context rather than the per-entry taxonomy.
pub fn load_datasets(path: &Path) -> Result<DatasetMap> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset file {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("dataset file {} is not valid JSON", path.display()))?;

    let Value::Object(entries) = value else {
        bail!(
            "dataset file {} must contain a top-level object mapping dataset names",
            path.display()
        );
    };

    let mut datasets = DatasetMap::new();
    for (name, entry) in entries {
        let dataset = Dataset::from_value(&name, entry)?;
        tracing::debug!(dataset = %name, shape = %dataset.shape(), "loaded dataset");
        datasets.insert(name, dataset);
    }
    Ok(datasets)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
