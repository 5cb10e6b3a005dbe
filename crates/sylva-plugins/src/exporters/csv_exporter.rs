//! CSV exporter: flat record to delimited rows

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use sylva_core::dataset::DataShape;
use sylva_core::error::RenderError;
use sylva_core::schema::{FieldSpec, FieldType, ValidatedConfig};
use sylva_core::site_config::PluginKind;
use sylva_core::{ArtifactKind, RenderResult};

use crate::plugin::{Plugin, PluginDescriptor, RenderContext};

const NAME: &str = "csv_exporter";

/// Writes a flat record as CSV under `output_dir`. Parallel array fields
/// become rows; scalar-only records become a single row. `columns` selects
/// and orders the exported fields, defaulting to every record field.
#[derive(Debug)]
pub struct CsvExporter;

#[async_trait]
impl Plugin for CsvExporter {
    fn descriptor(&self) -> PluginDescriptor {
        PluginDescriptor::new(
            NAME,
            PluginKind::Exporter,
            DataShape::Record,
            "CSV export of a flat record",
            vec![
                FieldSpec::required("output_dir", FieldType::String),
                FieldSpec::optional("filename", FieldType::String),
                FieldSpec::optional("columns", FieldType::Array),
                FieldSpec::optional("delimiter", FieldType::String).with_default(Value::from(",")),
            ],
        )
    }

    /// `columns` entries name dataset fields, so the binding layer enforces
    /// their presence up front.
    fn fields_used(&self, config: &ValidatedConfig) -> BTreeSet<String> {
        config
            .array_value("columns")
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    }

    async fn render(&self, ctx: RenderContext) -> Result<Vec<RenderResult>, RenderError> {
        let record = ctx
            .input
            .as_record()
            .ok_or_else(|| RenderError::plugin(NAME, "expected a flat record dataset"))?;

        let delimiter = parse_delimiter(ctx.config.str_value("delimiter").unwrap_or(","))?;
        let columns: Vec<String> = match ctx.config.array_value("columns") {
            Some(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        RenderError::plugin(NAME, "'columns' entries must be strings")
                    })
                })
                .collect::<Result<_, _>>()?,
            None => record.keys().cloned().collect(),
        };
        if columns.is_empty() {
            return Err(RenderError::plugin(NAME, "record has no fields to export"));
        }

        let rows = tabulate(record, &columns)?;

        let mut out = String::new();
        out.push_str(&join_row(
            &columns.iter().map(|c| Value::from(c.as_str())).collect::<Vec<_>>(),
            delimiter,
        ));
        out.push('\n');
        for row in rows {
            out.push_str(&join_row(&row, delimiter));
            out.push('\n');
        }

        let filename = match ctx.config.str_value("filename") {
            Some(name) => name.to_string(),
            None => format!("{}.csv", ctx.source),
        };
        let output_dir = ctx.config.required_str("output_dir")?;
        let target = Path::new(output_dir).join(filename);

        Ok(vec![RenderResult::new(
            ArtifactKind::Csv,
            out.into_bytes(),
            target,
        )])
    }
}

/// Turn the selected columns into row-major cells. All-array columns zip
/// into one row per element; all-scalar columns yield a single row.
fn tabulate(
    record: &serde_json::Map<String, Value>,
    columns: &[String],
) -> Result<Vec<Vec<Value>>, RenderError> {
    let cells: Vec<&Value> = columns
        .iter()
        .map(|c| record.get(c).unwrap_or(&Value::Null))
        .collect();

    let array_lengths: Vec<Option<usize>> = cells
        .iter()
        .map(|v| v.as_array().map(Vec::len))
        .collect();

    if array_lengths.iter().all(Option::is_none) {
        return Ok(vec![cells.into_iter().cloned().collect()]);
    }
    if array_lengths.iter().any(Option::is_none) {
        return Err(RenderError::plugin(
            NAME,
            "cannot mix array and scalar fields in one CSV export",
        ));
    }

    let lengths: BTreeSet<usize> = array_lengths.iter().flatten().copied().collect();
    if lengths.len() > 1 {
        return Err(RenderError::plugin(
            NAME,
            "array fields have mismatched lengths",
        ));
    }
    let row_count = lengths.into_iter().next().unwrap_or(0);

    let mut rows = Vec::with_capacity(row_count);
    for index in 0..row_count {
        rows.push(
            cells
                .iter()
                .map(|v| v.as_array().and_then(|a| a.get(index)).cloned().unwrap_or(Value::Null))
                .collect(),
        );
    }
    Ok(rows)
}

fn parse_delimiter(raw: &str) -> Result<char, RenderError> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(RenderError::plugin(
            NAME,
            "'delimiter' must be a single character",
        )),
    }
}

fn join_row(cells: &[Value], delimiter: char) -> String {
    cells
        .iter()
        .map(|cell| escape_cell(cell, delimiter))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string())
}

fn escape_cell(value: &Value, delimiter: char) -> String {
    let raw = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // nested structures are exported as their JSON text
        other => other.to_string(),
    };
    if raw.contains(delimiter) || raw.contains('"') || raw.contains('\n') || raw.contains('\r') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw
    }
}
