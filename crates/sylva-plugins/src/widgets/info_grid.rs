//! Info grid widget: labelled scalar facts from a record

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::{json, Value};

use sylva_core::dataset::DataShape;
use sylva_core::error::RenderError;
use sylva_core::schema::{FieldSpec, FieldType, ValidatedConfig};
use sylva_core::site_config::PluginKind;
use sylva_core::{ArtifactKind, RenderResult};

use crate::plugin::{Plugin, PluginDescriptor, RenderContext};

const NAME: &str = "info_grid";

/// Renders a definition grid of labelled values picked out of a record,
/// e.g. the general information block of a shape page (area, elevation,
/// rainfall). Canonical convention: `info_grid` with a `fields` list; the
/// `info_panel`/`mapping` aliases are normalized away during config load.
#[derive(Debug)]
pub struct InfoGrid;

#[async_trait]
impl Plugin for InfoGrid {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(
            NAME,
            PluginKind::Widget,
            DataShape::Record,
            "Grid of labelled scalar facts from a record",
            vec![
                FieldSpec::required("fields", FieldType::Array).with_element(vec![
                    FieldSpec::required("label", FieldType::String),
                    FieldSpec::required("source", FieldType::String).data_bound(),
                    FieldSpec::optional("format", FieldType::String),
                ]),
                FieldSpec::optional("title", FieldType::String),
            ],
        )
    }

    /// The dataset fields come from the nested `fields[].source` entries,
    /// not from a top-level data-bound param.
    fn fields_used(&self, config: &ValidatedConfig) -> BTreeSet<String> {
        let mut used = BTreeSet::new();
        if let Some(items) = config.array_value("fields") {
            for item in items {
                if let Some(source) = item.get("source").and_then(Value::as_str) {
                    used.insert(source.to_string());
                }
            }
        }
        used
    }

    async fn render(&self, ctx: RenderContext) -> Result<Vec<RenderResult>, RenderError> {
        let record = ctx
            .input
            .as_record()
            .ok_or_else(|| RenderError::plugin(NAME, "expected a flat record dataset"))?;

        let items = ctx.config.required_array("fields")?;
        let rows: Vec<Value> = items
            .iter()
            .map(|item| {
                // Element shape was validated; missing keys here mean the
                // schema and this accessor disagree.
                let label = item.get("label").and_then(Value::as_str).unwrap_or_default();
                let source = item.get("source").and_then(Value::as_str).unwrap_or_default();
                json!({
                    "label": label,
                    "value": record.get(source).cloned().unwrap_or(Value::Null),
                    "format": item.get("format"),
                })
            })
            .collect();

        let mut tera_ctx = tera::Context::new();
        tera_ctx.insert("title", &ctx.config.get("title"));
        tera_ctx.insert("rows", &rows);
        let html = ctx.theme.render("widgets/info_grid.html", &tera_ctx)?;

        Ok(vec![RenderResult::new(
            ArtifactKind::HtmlFragment,
            html,
            format!("widgets/{}.html", ctx.slug()),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginInputData;
    use crate::test_support::context_for;

    fn general_info() -> PluginInputData {
        PluginInputData::Record(
            json!({"area_ha": 84523, "elevation_max": 1628, "province": "Nord"})
                .as_object()
                .cloned()
                .unwrap(),
        )
    }

    fn grid_params() -> Value {
        json!({"fields": [
            {"label": "Area (ha)", "source": "area_ha", "format": "number"},
            {"label": "Province", "source": "province"}
        ]})
    }

    #[tokio::test]
    async fn renders_one_row_per_configured_field() {
        let ctx = context_for(&InfoGrid, grid_params(), general_info());
        let results = InfoGrid.render(ctx).await.unwrap();

        let html = std::str::from_utf8(&results[0].payload).unwrap();
        assert!(html.contains("<dt>Area (ha)</dt>"));
        assert!(html.contains("84,523"));
        assert!(html.contains("<dt>Province</dt>"));
        assert!(html.contains("<dd>Nord</dd>"));
    }

    #[tokio::test]
    async fn fields_used_collects_nested_sources() {
        let ctx = context_for(&InfoGrid, grid_params(), general_info());
        let used: Vec<_> = InfoGrid.fields_used(&ctx.config).into_iter().collect();
        assert_eq!(used, vec!["area_ha", "province"]);
    }
}
