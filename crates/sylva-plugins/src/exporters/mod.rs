//! Built-in exporter plugins
//!
//! Exporters receive the same bound inputs as widgets but produce standalone
//! files under a configured `output_dir` instead of page fragments.

mod csv_exporter;
mod json_exporter;

pub use csv_exporter::CsvExporter;
pub use json_exporter::JsonExporter;
