//! Site configuration model
//!
//! The YAML site configuration is an ordered list of widget entries and an
//! ordered list of exporter entries. Plugin kind is inferred from which list
//! an entry appears under. Loading normalizes deprecated naming aliases
//! (`info_panel` -> `info_grid`, `mapping` -> `fields`) so the rest of the
//! pipeline only ever sees the canonical convention.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Plugin kind, inferred from the configuration list an entry appears under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    Widget,
    Exporter,
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginKind::Widget => write!(f, "widget"),
            PluginKind::Exporter => write!(f, "exporter"),
        }
    }
}

/// Deprecated plugin-name aliases, normalized at load time.
const PLUGIN_ALIASES: &[(&str, &str)] = &[("info_panel", "info_grid")];

/// Deprecated param-key aliases per canonical plugin name.
const PARAM_ALIASES: &[(&str, &str, &str)] = &[("info_grid", "mapping", "fields")];

#[derive(Debug, Clone, Deserialize)]
struct RawWidgetEntry {
    plugin: String,
    #[serde(default)]
    data_source: Option<String>,
    #[serde(default)]
    params: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawExporterEntry {
    plugin: String,
    #[serde(default)]
    data_source: Option<String>,
    #[serde(default)]
    output_dir: Option<String>,
    #[serde(default)]
    params: Map<String, Value>,
}

/// Parsed site configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    widgets: Vec<RawWidgetEntry>,
    #[serde(default)]
    exporters: Vec<RawExporterEntry>,
}

/// One normalized configuration entry, ready for the orchestrator.
#[derive(Debug, Clone)]
pub struct ConfigEntry {
    pub kind: PluginKind,
    pub plugin: String,
    pub data_source: Option<String>,
    pub params: Map<String, Value>,
    /// Stable label for reports and artifact names, e.g. `widgets[0]:bar_plot`.
    pub label: String,
}

impl SiteConfig {
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yml::from_str(raw).context("invalid site configuration YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read site configuration {}", path.display()))?;
        Self::from_yaml(&raw)
            .with_context(|| format!("failed to parse site configuration {}", path.display()))
    }

    /// Flatten into the ordered entry sequence: widgets first, then
    /// exporters, each in declared order. Aliases are normalized here.
    pub fn into_entries(self) -> Vec<ConfigEntry> {
        let mut entries = Vec::with_capacity(self.widgets.len() + self.exporters.len());

        for (index, widget) in self.widgets.into_iter().enumerate() {
            let plugin = canonical_plugin_name(&widget.plugin);
            let params = canonical_params(&plugin, widget.params);
            entries.push(ConfigEntry {
                label: format!("widgets[{index}]:{plugin}"),
                kind: PluginKind::Widget,
                plugin,
                data_source: widget.data_source,
                params,
            });
        }

        for (index, exporter) in self.exporters.into_iter().enumerate() {
            let plugin = canonical_plugin_name(&exporter.plugin);
            let mut params = canonical_params(&plugin, exporter.params);
            // The exporter form carries output_dir at the entry level; fold it
            // into the params so the plugin schema drives the required check.
            if let Some(output_dir) = exporter.output_dir {
                params
                    .entry("output_dir".to_string())
                    .or_insert(Value::String(output_dir));
            }
            entries.push(ConfigEntry {
                label: format!("exporters[{index}]:{plugin}"),
                kind: PluginKind::Exporter,
                plugin,
                data_source: exporter.data_source,
                params,
            });
        }

        entries
    }
}

fn canonical_plugin_name(name: &str) -> String {
    for (alias, canonical) in PLUGIN_ALIASES {
        if name == *alias {
            tracing::warn!(
                alias,
                canonical,
                "plugin name is a deprecated alias, use the canonical name"
            );
            return (*canonical).to_string();
        }
    }
    name.to_string()
}

fn canonical_params(plugin: &str, mut params: Map<String, Value>) -> Map<String, Value> {
    for (target, alias, canonical) in PARAM_ALIASES {
        if plugin != *target {
            continue;
        }
        if let Some(value) = params.remove(*alias) {
            if params.contains_key(*canonical) {
                tracing::warn!(
                    plugin,
                    alias,
                    canonical,
                    "both alias and canonical key present, keeping the canonical value"
                );
            } else {
                tracing::warn!(
                    plugin,
                    alias,
                    canonical,
                    "param key is a deprecated alias, use the canonical key"
                );
                params.insert((*canonical).to_string(), value);
            }
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SITE_YAML: &str = r#"
widgets:
  - plugin: bar_plot
    data_source: dbh_distribution
    params:
      x_field: bins
      y_field: counts
  - plugin: radial_gauge
    params:
      value_field: mean
      max_value: 100
exporters:
  - plugin: json_exporter
    output_dir: exports/json
    data_source: general_info
"#;

    #[test]
    fn parses_widgets_then_exporters_in_declared_order() {
        let entries = SiteConfig::from_yaml(SITE_YAML).unwrap().into_entries();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].plugin, "bar_plot");
        assert_eq!(entries[0].kind, PluginKind::Widget);
        assert_eq!(entries[0].data_source.as_deref(), Some("dbh_distribution"));
        assert_eq!(entries[0].label, "widgets[0]:bar_plot");
        assert_eq!(entries[1].plugin, "radial_gauge");
        assert!(entries[1].data_source.is_none());
        assert_eq!(entries[2].kind, PluginKind::Exporter);
        assert_eq!(entries[2].label, "exporters[0]:json_exporter");
    }

    #[test]
    fn exporter_output_dir_is_folded_into_params() {
        let entries = SiteConfig::from_yaml(SITE_YAML).unwrap().into_entries();
        assert_eq!(
            entries[2].params.get("output_dir"),
            Some(&json!("exports/json"))
        );
    }

    #[test]
    fn deprecated_plugin_and_param_aliases_are_normalized() {
        let yaml = r#"
widgets:
  - plugin: info_panel
    data_source: general_info
    params:
      mapping:
        - label: Area
          source: area_ha
"#;
        let entries = SiteConfig::from_yaml(yaml).unwrap().into_entries();
        assert_eq!(entries[0].plugin, "info_grid");
        assert!(entries[0].params.contains_key("fields"));
        assert!(!entries[0].params.contains_key("mapping"));
    }

    #[test]
    fn canonical_key_wins_when_alias_is_also_present() {
        let yaml = r#"
widgets:
  - plugin: info_grid
    params:
      fields:
        - label: Canonical
          source: a
      mapping:
        - label: Alias
          source: b
"#;
        let entries = SiteConfig::from_yaml(yaml).unwrap().into_entries();
        let fields = entries[0].params.get("fields").unwrap();
        assert_eq!(fields[0]["label"], json!("Canonical"));
    }

    #[test]
    fn empty_configuration_yields_no_entries() {
        let entries = SiteConfig::from_yaml("{}").unwrap().into_entries();
        assert!(entries.is_empty());
    }

    #[test]
    fn missing_params_defaults_to_empty_mapping() {
        let yaml = r#"
widgets:
  - plugin: interactive_map
    data_source: plot_locations
"#;
        let entries = SiteConfig::from_yaml(yaml).unwrap().into_entries();
        assert!(entries[0].params.is_empty());
    }
}
