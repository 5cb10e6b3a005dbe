//! Radial gauge widget for a single scalar indicator

use async_trait::async_trait;
use serde_json::{json, Value};

use sylva_core::dataset::DataShape;
use sylva_core::error::RenderError;
use sylva_core::schema::{FieldSpec, FieldType};
use sylva_core::site_config::PluginKind;
use sylva_core::{ArtifactKind, RenderResult};

use crate::plugin::{Plugin, PluginDescriptor, RenderContext};

const NAME: &str = "radial_gauge";

/// Renders a radial gauge for one scalar field of a record, e.g. a forest
/// cover percentage or a diversity index against its ceiling. A null value
/// (the transform stage's "no data" marker) renders as an empty gauge.
#[derive(Debug)]
pub struct RadialGauge;

#[async_trait]
impl Plugin for RadialGauge {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(
            NAME,
            PluginKind::Widget,
            DataShape::Record,
            "Radial gauge for a single scalar indicator",
            vec![
                FieldSpec::required("value_field", FieldType::String).data_bound(),
                FieldSpec::required("max_value", FieldType::Number),
                FieldSpec::optional("units", FieldType::String).with_default(json!("")),
                FieldSpec::optional("title", FieldType::String),
            ],
        )
    }

    async fn render(&self, ctx: RenderContext) -> Result<Vec<RenderResult>, RenderError> {
        let record = ctx
            .input
            .as_record()
            .ok_or_else(|| RenderError::plugin(NAME, "expected a flat record dataset"))?;

        let value_field = ctx.config.required_str("value_field")?;
        let max_value = ctx.config.required_f64("max_value")?;
        let value = match record.get(value_field) {
            Some(Value::Number(n)) => Value::from(n.clone()),
            Some(Value::Null) | None => Value::Null,
            Some(other) => {
                return Err(RenderError::plugin(
                    NAME,
                    format!(
                        "field '{value_field}' must be a number or null, found {other}"
                    ),
                ))
            }
        };

        let spec = json!({
            "kind": "gauge",
            "value": value,
            "max": max_value,
            "units": ctx.config.str_value("units"),
        });

        let mut tera_ctx = tera::Context::new();
        tera_ctx.insert("title", &ctx.config.get("title"));
        tera_ctx.insert("spec", &spec);
        let html = ctx.theme.render("widgets/radial_gauge.html", &tera_ctx)?;

        Ok(vec![RenderResult::new(
            ArtifactKind::HtmlFragment,
            html,
            format!("widgets/{}.html", ctx.slug()),
        )])
    }
}
