//! Plugin contract
//!
//! A plugin declares its identity and accepted configuration as a
//! [`PluginDescriptor`] and implements one operation: `render`, receiving
//! already-validated configuration and already-bound input data. Widgets
//! return HTML fragment artifacts, exporters return file artifacts (or
//! none). Plugins never construct each other; the registry is the single
//! source of truth for what plugins exist.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use sylva_core::dataset::{DataShape, Feature};
use sylva_core::error::RenderError;
use sylva_core::schema::{FieldSpec, ValidatedConfig};
use sylva_core::site_config::PluginKind;
use sylva_core::RenderResult;

use crate::theme::ThemeEngine;

/// Identity record of a plugin: unique name within its kind, declared
/// configuration schema, and the dataset shape its input must have.
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    pub name: String,
    pub kind: PluginKind,
    pub config_schema: Vec<FieldSpec>,
    pub data_shape: DataShape,
    pub description: String,
}

impl PluginDescriptor {
    pub fn new(
        name: impl Into<String>,
        kind: PluginKind,
        data_shape: DataShape,
        description: impl Into<String>,
        config_schema: Vec<FieldSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            config_schema,
            data_shape,
            description: description.into(),
        }
    }
}

/// Plugin-ready data payload produced by the binding resolver.
#[derive(Debug, Clone)]
pub enum PluginInputData {
    Record(Map<String, Value>),
    Features(Vec<Feature>),
}

impl PluginInputData {
    pub fn shape(&self) -> DataShape {
        match self {
            PluginInputData::Record(_) => DataShape::Record,
            PluginInputData::Features(_) => DataShape::Features,
        }
    }

    pub fn as_record(&self) -> Option<&Map<String, Value>> {
        match self {
            PluginInputData::Record(record) => Some(record),
            PluginInputData::Features(_) => None,
        }
    }

    pub fn as_features(&self) -> Option<&[Feature]> {
        match self {
            PluginInputData::Record(_) => None,
            PluginInputData::Features(features) => Some(features),
        }
    }

    /// JSON rendition of the payload, used by the exporters.
    pub fn to_value(&self) -> Value {
        match self {
            PluginInputData::Record(record) => Value::Object(record.clone()),
            PluginInputData::Features(features) => serde_json::json!({
                "type": "FeatureCollection",
                "features": features,
            }),
        }
    }
}

/// Per-entry execution context handed to a plugin.
///
/// Exclusively owned by the entry's execution; plugins must not retain it
/// beyond the render call.
#[derive(Clone)]
pub struct RenderContext {
    /// Entry label from the site configuration, e.g. `widgets[0]:bar_plot`.
    pub label: String,
    /// Name of the dataset the input was resolved from.
    pub source: String,
    pub input: PluginInputData,
    pub config: ValidatedConfig,
    /// Template capability for HTML fragment rendering.
    pub theme: Arc<ThemeEngine>,
}

impl RenderContext {
    /// Filesystem-safe slug derived from the entry label, used for default
    /// artifact file names.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.label.len());
        for ch in self.label.chars() {
            if ch.is_ascii_alphanumeric() {
                slug.push(ch.to_ascii_lowercase());
            } else if !slug.ends_with('-') && !slug.is_empty() {
                slug.push('-');
            }
        }
        slug.trim_end_matches('-').to_string()
    }
}

/// Trait that all plugins must implement.
#[async_trait]
pub trait Plugin: Send + Sync + Debug {
    /// The plugin's identity, schema and declared input shape.
    fn descriptor(&self) -> PluginDescriptor;

    /// Dataset fields this entry's configuration uses. The default walks the
    /// schema for `binds_data` string params; plugins with nested field
    /// lists (e.g. `info_grid`) override this.
    fn fields_used(&self, config: &ValidatedConfig) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        for spec in self.descriptor().config_schema {
            if spec.binds_data {
                if let Some(value) = config.str_value(&spec.name) {
                    fields.insert(value.to_string());
                }
            }
        }
        fields
    }

    /// Render or export with already-validated, already-bound inputs.
    async fn render(&self, ctx: RenderContext) -> Result<Vec<RenderResult>, RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sylva_core::schema::{validate, FieldType, Strictness};

    #[derive(Debug)]
    struct FakePlugin;

    #[async_trait]
    impl Plugin for FakePlugin {
        fn descriptor(&self) -> PluginDescriptor {
            PluginDescriptor::new(
                "fake",
                PluginKind::Widget,
                DataShape::Record,
                "test plugin",
                vec![
                    FieldSpec::required("x_field", FieldType::String).data_bound(),
                    FieldSpec::optional("title", FieldType::String),
                ],
            )
        }

        async fn render(&self, _ctx: RenderContext) -> Result<Vec<RenderResult>, RenderError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn default_fields_used_collects_data_bound_params() {
        let raw = json!({"x_field": "bins", "title": "DBH"});
        let config = validate(
            raw.as_object().unwrap(),
            &FakePlugin.descriptor().config_schema,
            Strictness::Strict,
        )
        .unwrap();

        let fields = FakePlugin.fields_used(&config);
        assert_eq!(fields.into_iter().collect::<Vec<_>>(), vec!["bins"]);
    }

    #[test]
    fn slug_is_filesystem_safe() {
        let ctx = RenderContext {
            label: "widgets[3]:bar_plot".to_string(),
            source: "dbh_distribution".to_string(),
            input: PluginInputData::Record(Map::new()),
            config: ValidatedConfig::default(),
            theme: Arc::new(ThemeEngine::empty()),
        };
        assert_eq!(ctx.slug(), "widgets-3-bar-plot");
    }
}
