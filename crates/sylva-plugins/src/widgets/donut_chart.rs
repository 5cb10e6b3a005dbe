//! Donut chart widget over label/value columns

use async_trait::async_trait;
use serde_json::{json, Value};

use sylva_core::dataset::DataShape;
use sylva_core::error::RenderError;
use sylva_core::schema::{FieldSpec, FieldType};
use sylva_core::site_config::PluginKind;
use sylva_core::{ArtifactKind, RenderResult};

use crate::plugin::{Plugin, PluginDescriptor, RenderContext};

const NAME: &str = "donut_chart";

/// Renders a donut chart from parallel label and value columns, e.g. land
/// cover proportions per class.
#[derive(Debug)]
pub struct DonutChart;

#[async_trait]
impl Plugin for DonutChart {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(
            NAME,
            PluginKind::Widget,
            DataShape::Record,
            "Donut chart over label/value columns",
            vec![
                FieldSpec::required("labels_field", FieldType::String).data_bound(),
                FieldSpec::required("values_field", FieldType::String).data_bound(),
                FieldSpec::optional("title", FieldType::String),
                FieldSpec::optional("hole_size", FieldType::Number).with_default(json!(0.5)),
            ],
        )
    }

    async fn render(&self, ctx: RenderContext) -> Result<Vec<RenderResult>, RenderError> {
        let record = ctx
            .input
            .as_record()
            .ok_or_else(|| RenderError::plugin(NAME, "expected a flat record dataset"))?;

        let labels_field = ctx.config.required_str("labels_field")?;
        let values_field = ctx.config.required_str("values_field")?;
        let labels = column(record, labels_field)?;
        let values = column(record, values_field)?;
        if labels.len() != values.len() {
            return Err(RenderError::plugin(
                NAME,
                format!(
                    "fields '{labels_field}' ({}) and '{values_field}' ({}) have mismatched lengths",
                    labels.len(),
                    values.len()
                ),
            ));
        }

        let spec = json!({
            "kind": "donut",
            "hole": ctx.config.f64_value("hole_size"),
            "labels": labels,
            "values": values,
        });

        let mut tera_ctx = tera::Context::new();
        tera_ctx.insert("chart_kind", "donut");
        tera_ctx.insert("title", &ctx.config.get("title"));
        tera_ctx.insert("spec", &spec);
        let html = ctx.theme.render("widgets/chart.html", &tera_ctx)?;

        Ok(vec![RenderResult::new(
            ArtifactKind::HtmlFragment,
            html,
            format!("widgets/{}.html", ctx.slug()),
        )])
    }
}

fn column<'a>(
    record: &'a serde_json::Map<String, Value>,
    field: &str,
) -> Result<&'a Vec<Value>, RenderError> {
    record
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| RenderError::plugin(NAME, format!("field '{field}' is not an array")))
}
