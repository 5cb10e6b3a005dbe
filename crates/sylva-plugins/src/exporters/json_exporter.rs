//! JSON exporter: dump a bound dataset as a standalone file

use std::path::Path;

use async_trait::async_trait;
use serde_json::json;

use sylva_core::dataset::DataShape;
use sylva_core::error::RenderError;
use sylva_core::schema::{FieldSpec, FieldType};
use sylva_core::site_config::PluginKind;
use sylva_core::{ArtifactKind, RenderResult};

use crate::plugin::{Plugin, PluginDescriptor, RenderContext};

const NAME: &str = "json_exporter";

/// Writes the bound record as a JSON file under `output_dir`. The file name
/// defaults to the dataset name.
#[derive(Debug)]
pub struct JsonExporter;

#[async_trait]
impl Plugin for JsonExporter {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(
            NAME,
            PluginKind::Exporter,
            DataShape::Record,
            "Standalone JSON dump of a dataset",
            vec![
                FieldSpec::required("output_dir", FieldType::String),
                FieldSpec::optional("filename", FieldType::String),
                FieldSpec::optional("pretty", FieldType::Bool).with_default(json!(true)),
            ],
        )
    }

    async fn render(&self, ctx: RenderContext) -> Result<Vec<RenderResult>, RenderError> {
        let output_dir = ctx.config.required_str("output_dir")?;
        let payload = ctx.input.to_value();
        let encoded = if ctx.config.bool_value("pretty").unwrap_or(true) {
            serde_json::to_vec_pretty(&payload)
        } else {
            serde_json::to_vec(&payload)
        }
        .map_err(|e| RenderError::plugin(NAME, format!("failed to encode dataset: {e}")))?;

        let filename = match ctx.config.str_value("filename") {
            Some(name) => name.to_string(),
            None => format!("{}.json", ctx.source),
        };
        let target = Path::new(output_dir).join(filename);

        Ok(vec![RenderResult::new(ArtifactKind::Json, encoded, target)])
    }
}
