//! Bar plot widget over paired x/y columns

use async_trait::async_trait;
use serde_json::{json, Value};

use sylva_core::dataset::DataShape;
use sylva_core::error::RenderError;
use sylva_core::schema::{FieldSpec, FieldType};
use sylva_core::site_config::PluginKind;
use sylva_core::{ArtifactKind, RenderResult};

use crate::plugin::{Plugin, PluginDescriptor, RenderContext};

const NAME: &str = "bar_plot";

/// Renders a bar chart from two parallel columns of a flat record, e.g. a
/// diameter distribution (`bins` x `counts`).
#[derive(Debug)]
pub struct BarPlot;

#[async_trait]
impl Plugin for BarPlot {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(
            NAME,
            PluginKind::Widget,
            DataShape::Record,
            "Bar chart over paired x/y columns",
            vec![
                FieldSpec::required("x_field", FieldType::String).data_bound(),
                FieldSpec::required("y_field", FieldType::String).data_bound(),
                FieldSpec::optional("title", FieldType::String),
                FieldSpec::optional("bar_color", FieldType::String).with_default(json!("#2e7d32")),
                FieldSpec::optional("sort_descending", FieldType::Bool).with_default(json!(false)),
            ],
        )
    }

    async fn render(&self, ctx: RenderContext) -> Result<Vec<RenderResult>, RenderError> {
        let record = ctx
            .input
            .as_record()
            .ok_or_else(|| RenderError::plugin(NAME, "expected a flat record dataset"))?;

        let x_field = ctx.config.required_str("x_field")?;
        let y_field = ctx.config.required_str("y_field")?;
        let xs = column(record, x_field)?;
        let ys = column(record, y_field)?;
        if xs.len() != ys.len() {
            return Err(RenderError::plugin(
                NAME,
                format!(
                    "fields '{x_field}' ({}) and '{y_field}' ({}) have mismatched lengths",
                    xs.len(),
                    ys.len()
                ),
            ));
        }

        let mut pairs: Vec<Value> = xs
            .iter()
            .zip(ys)
            .map(|(x, y)| json!({"x": x, "y": y}))
            .collect();
        if ctx.config.bool_value("sort_descending").unwrap_or(false) {
            pairs.sort_by(|a, b| {
                let ya = a["y"].as_f64().unwrap_or(f64::NEG_INFINITY);
                let yb = b["y"].as_f64().unwrap_or(f64::NEG_INFINITY);
                yb.partial_cmp(&ya).unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let spec = json!({
            "kind": "bar",
            "color": ctx.config.str_value("bar_color"),
            "x_label": x_field,
            "y_label": y_field,
            "pairs": pairs,
        });

        let mut tera_ctx = tera::Context::new();
        tera_ctx.insert("chart_kind", "bar");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::PluginInputData;
    use crate::test_support::context_for;

    fn dbh_record() -> PluginInputData {
        PluginInputData::Record(
            json!({"bins": [0, 10, 20], "counts": [5, 3, 1]})
                .as_object()
                .cloned()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn binds_xy_pairs_in_order() {
        let ctx = context_for(
            &BarPlot,
            json!({"x_field": "bins", "y_field": "counts"}),
            dbh_record(),
        );
        let results = BarPlot.render(ctx).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].artifact, ArtifactKind::HtmlFragment);
        let html = std::str::from_utf8(&results[0].payload).unwrap();
        assert!(html.contains(r#"{"x":0,"y":5}"#));
        assert!(html.contains(r#"{"x":10,"y":3}"#));
        assert!(html.contains(r#"{"x":20,"y":1}"#));
        // declared order preserved
        let first = html.find(r#"{"x":0,"y":5}"#).unwrap();
        let last = html.find(r#"{"x":20,"y":1}"#).unwrap();
        assert!(first < last);
    }

    #[tokio::test]
    async fn sort_descending_reorders_pairs_by_value() {
        let ctx = context_for(
            &BarPlot,
            json!({"x_field": "bins", "y_field": "counts", "sort_descending": true}),
            PluginInputData::Record(
                json!({"bins": ["a", "b", "c"], "counts": [1, 9, 4]})
                    .as_object()
                    .cloned()
                    .unwrap(),
            ),
        );
        let results = BarPlot.render(ctx).await.unwrap();
        let html = std::str::from_utf8(&results[0].payload).unwrap();
        let b = html.find(r#"{"x":"b","y":9}"#).unwrap();
        let c = html.find(r#"{"x":"c","y":4}"#).unwrap();
        let a = html.find(r#"{"x":"a","y":1}"#).unwrap();
        assert!(b < c && c < a);
    }

    #[tokio::test]
    async fn mismatched_column_lengths_fail() {
        let ctx = context_for(
            &BarPlot,
            json!({"x_field": "bins", "y_field": "counts"}),
            PluginInputData::Record(
                json!({"bins": [0, 10], "counts": [5]})
                    .as_object()
                    .cloned()
                    .unwrap(),
            ),
        );
        let err = BarPlot.render(ctx).await.unwrap_err();
        assert_eq!(err.kind_name(), "plugin_execution");
        assert!(err.to_string().contains("mismatched lengths"));
    }

    #[tokio::test]
    async fn non_array_column_fails() {
        let ctx = context_for(
            &BarPlot,
            json!({"x_field": "bins", "y_field": "counts"}),
            PluginInputData::Record(
                json!({"bins": 3, "counts": [5]}).as_object().cloned().unwrap(),
            ),
        );
        let err = BarPlot.render(ctx).await.unwrap_err();
        assert!(err.to_string().contains("'bins' is not an array"));
    }

    #[test]
    fn declares_both_axis_fields_as_data_bound() {
        let raw = json!({"x_field": "bins", "y_field": "counts"});
        let config = sylva_core::schema::validate(
            raw.as_object().unwrap(),
            &BarPlot.descriptor().config_schema,
            sylva_core::schema::Strictness::Strict,
        )
        .unwrap();
        let fields: Vec<_> = BarPlot.fields_used(&config).into_iter().collect();
        assert_eq!(fields, vec!["bins", "counts"]);
    }
}
