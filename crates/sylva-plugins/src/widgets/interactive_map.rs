//! Interactive map widget over a geometry feature collection

use async_trait::async_trait;
use serde_json::json;

use sylva_core::dataset::DataShape;
use sylva_core::error::RenderError;
use sylva_core::schema::{FieldSpec, FieldType};
use sylva_core::site_config::PluginKind;
use sylva_core::{ArtifactKind, RenderResult};

use crate::plugin::{Plugin, PluginDescriptor, RenderContext};

const NAME: &str = "interactive_map";

/// Renders a map fragment for a feature collection (plot locations, shape
/// boundaries). The collection itself is written as a GeoJSON sidecar file
/// the front-end map layer fetches; the fragment references it by path.
#[derive(Debug)]
pub struct InteractiveMap;

#[async_trait]
impl Plugin for InteractiveMap {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(
            NAME,
            PluginKind::Widget,
            DataShape::Features,
            "Interactive map over a geometry feature collection",
            vec![
                FieldSpec::optional("title", FieldType::String),
                FieldSpec::optional("zoom", FieldType::Number).with_default(json!(8)),
                FieldSpec::optional("center", FieldType::Array),
                FieldSpec::optional("layer_color", FieldType::String)
                    .with_default(json!("#1b5e20")),
            ],
        )
    }

    async fn render(&self, ctx: RenderContext) -> Result<Vec<RenderResult>, RenderError> {
        let features = ctx
            .input
            .as_features()
            .ok_or_else(|| RenderError::plugin(NAME, "expected a feature collection dataset"))?;

        let layer_path = format!("assets/{}.geojson", ctx.slug());
        let collection = ctx.input.to_value();
        let geojson = serde_json::to_vec(&collection)
            .map_err(|e| RenderError::plugin(NAME, format!("failed to encode layer: {e}")))?;

        let spec = json!({
            "kind": "map",
            "zoom": ctx.config.get("zoom"),
            "center": ctx.config.get("center"),
            "layer_color": ctx.config.str_value("layer_color"),
            "layer": layer_path,
            "feature_count": features.len(),
        });

        let mut tera_ctx = tera::Context::new();
        tera_ctx.insert("title", &ctx.config.get("title"));
        tera_ctx.insert("layer_path", &layer_path);
        tera_ctx.insert("spec", &spec);
        let html = ctx.theme.render("widgets/interactive_map.html", &tera_ctx)?;

        Ok(vec![
            RenderResult::new(
                ArtifactKind::HtmlFragment,
                html,
                format!("widgets/{}.html", ctx.slug()),
            ),
            RenderResult::new(ArtifactKind::File, geojson, layer_path),
        ])
    }
}
