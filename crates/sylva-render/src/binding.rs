//! Data binding resolver
//!
//! Resolves a widget/exporter's declared data dependency against the
//! dataset mapping supplied by the upstream transform stage: the named
//! dataset must exist, have the shape the plugin declares, and carry every
//! field the entry's configuration uses. Values pass through untouched;
//! numeric and formatting semantics belong to the plugin.

use std::collections::BTreeSet;

use sylva_core::dataset::{DataShape, Dataset, DatasetMap};
use sylva_core::error::RenderError;
use sylva_plugins::PluginInputData;

/// Declared dependency of one entry on a named dataset.
#[derive(Debug, Clone)]
pub struct DataSourceBinding {
    /// Dataset name from the configuration; `None` binds to the mapping's
    /// sole dataset when there is exactly one.
    pub source_name: Option<String>,
    /// Dataset fields the entry's configuration uses.
    pub fields_used: BTreeSet<String>,
    /// Shape the plugin descriptor declares.
    pub shape: DataShape,
}

/// A successfully resolved binding: the dataset name that was bound plus
/// the plugin-ready payload.
#[derive(Debug)]
pub struct ResolvedBinding {
    pub source: String,
    pub input: PluginInputData,
}

/// Resolve a binding against the dataset mapping.
pub fn resolve(
    binding: &DataSourceBinding,
    datasets: &DatasetMap,
) -> Result<ResolvedBinding, RenderError> {
    let (source, dataset) = match &binding.source_name {
        Some(name) => {
            let dataset = datasets
                .get(name)
                .ok_or_else(|| RenderError::MissingDataSource {
                    source_name: name.clone(),
                })?;
            (name.clone(), dataset)
        }
        None => {
            // Implicit binding is only unambiguous with a single dataset.
            let mut iter = datasets.iter();
            match (iter.next(), iter.next()) {
                (Some((name, dataset)), None) => (name.clone(), dataset),
                _ => {
                    return Err(RenderError::MissingDataSource {
                        source_name: "(default)".to_string(),
                    })
                }
            }
        }
    };

    if dataset.shape() != binding.shape {
        return Err(RenderError::IncompatibleDataShape {
            source_name: source,
            expected: binding.shape,
            actual: dataset.shape(),
        });
    }

    let input = match dataset {
        Dataset::Record(record) => {
            let missing: Vec<String> = binding
                .fields_used
                .iter()
                .filter(|field| !record.contains_key(*field))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(RenderError::MissingField {
                    source_name: source,
                    fields: missing,
                });
            }
            // Project the used fields; an empty set means the plugin takes
            // the whole record (exporters without a columns selection).
            if binding.fields_used.is_empty() {
                PluginInputData::Record(record.clone())
            } else {
                PluginInputData::Record(
                    record
                        .iter()
                        .filter(|(key, _)| binding.fields_used.contains(*key))
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect(),
                )
            }
        }
        Dataset::Features(features) => {
            let missing: Vec<String> = binding
                .fields_used
                .iter()
                .filter(|field| {
                    features
                        .iter()
                        .any(|feature| !feature.properties.contains_key(*field))
                })
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(RenderError::MissingField {
                    source_name: source,
                    fields: missing,
                });
            }
            // Features pass through whole; the map layer needs geometry and
            // all properties.
            PluginInputData::Features(features.clone())
        }
    };

    Ok(ResolvedBinding { source, input })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sylva_core::dataset::Feature;

    fn record_binding(source: Option<&str>, fields: &[&str]) -> DataSourceBinding {
        DataSourceBinding {
            source_name: source.map(str::to_string),
            fields_used: fields.iter().map(|f| f.to_string()).collect(),
            shape: DataShape::Record,
        }
    }

    fn datasets() -> DatasetMap {
        let mut map = DatasetMap::new();
        map.insert(
            "dbh_distribution".to_string(),
            Dataset::Record(
                json!({"bins": [0, 10, 20], "counts": [5, 3, 1], "total": 9})
                    .as_object()
                    .cloned()
                    .unwrap(),
            ),
        );
        map.insert(
            "plot_locations".to_string(),
            Dataset::Features(vec![Feature {
                geometry: json!({"type": "Point", "coordinates": [165.4, -21.6]}),
                properties: json!({"plot_id": 1}).as_object().cloned().unwrap(),
            }]),
        );
        map
    }

    #[test]
    fn projects_used_fields_of_a_record() {
        let resolved = resolve(
            &record_binding(Some("dbh_distribution"), &["bins", "counts"]),
            &datasets(),
        )
        .unwrap();

        assert_eq!(resolved.source, "dbh_distribution");
        let record = resolved.input.as_record().unwrap();
        assert_eq!(record.len(), 2);
        assert!(record.contains_key("bins"));
        assert!(!record.contains_key("total"));
    }

    #[test]
    fn empty_field_set_takes_whole_record() {
        let resolved =
            resolve(&record_binding(Some("dbh_distribution"), &[]), &datasets()).unwrap();
        assert_eq!(resolved.input.as_record().unwrap().len(), 3);
    }

    #[test]
    fn unknown_source_is_reported() {
        let err = resolve(&record_binding(Some("no_such"), &[]), &datasets()).unwrap_err();
        assert_eq!(err.kind_name(), "missing_data_source");
        assert!(err.to_string().contains("no_such"));
    }

    #[test]
    fn missing_fields_are_aggregated() {
        let err = resolve(
            &record_binding(Some("dbh_distribution"), &["bins", "mean", "stddev"]),
            &datasets(),
        )
        .unwrap_err();
        let RenderError::MissingField { fields, .. } = err else {
            panic!("expected a missing-field error");
        };
        assert_eq!(fields, vec!["mean", "stddev"]);
    }

    #[test]
    fn shape_mismatch_is_reported() {
        let err = resolve(
            &DataSourceBinding {
                source_name: Some("plot_locations".to_string()),
                fields_used: BTreeSet::new(),
                shape: DataShape::Record,
            },
            &datasets(),
        )
        .unwrap_err();
        assert_eq!(err.kind_name(), "incompatible_data_shape");
    }

    #[test]
    fn implicit_binding_uses_sole_dataset() {
        let mut map = DatasetMap::new();
        map.insert(
            "general_info".to_string(),
            Dataset::Record(json!({"mean": 3.2}).as_object().cloned().unwrap()),
        );

        let resolved = resolve(&record_binding(None, &["mean"]), &map).unwrap();
        assert_eq!(resolved.source, "general_info");
    }

    #[test]
    fn implicit_binding_is_ambiguous_with_several_datasets() {
        let err = resolve(&record_binding(None, &[]), &datasets()).unwrap_err();
        assert_eq!(err.kind_name(), "missing_data_source");
    }

    #[test]
    fn feature_property_presence_is_enforced() {
        let err = resolve(
            &DataSourceBinding {
                source_name: Some("plot_locations".to_string()),
                fields_used: ["species_count".to_string()].into(),
                shape: DataShape::Features,
            },
            &datasets(),
        )
        .unwrap_err();
        let RenderError::MissingField { fields, .. } = err else {
            panic!("expected a missing-field error");
        };
        assert_eq!(fields, vec!["species_count"]);
    }
}
