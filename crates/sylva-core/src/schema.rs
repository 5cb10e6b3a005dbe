//! Plugin configuration schema and validator
//!
//! Each plugin declares its accepted configuration keys as a list of
//! [`FieldSpec`]s. A generic validator walks the schema against the raw
//! params mapping from the site configuration and either produces an
//! immutable [`ValidatedConfig`] or a `RenderError::Configuration` carrying
//! every field error at once. Validation never stops at the first bad field.

use serde_json::{Map, Value};

use crate::error::{FieldError, RenderError};

/// Accepted JSON type of one configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Bool,
    Array,
    Object,
}

impl FieldType {
    fn name(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }

    /// Numeric fields accept integer or floating literals; everything else
    /// is an exact JSON type match.
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }
}

/// One accepted configuration key of a plugin.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub required: bool,
    pub field_type: FieldType,
    /// Applied when the field is absent from the raw config.
    pub default: Option<Value>,
    /// Declared element shape for array fields, e.g. `fields: [{label, source}]`.
    pub element: Option<Vec<FieldSpec>>,
    /// Marks a field whose *value* names a dataset field (`x_field`,
    /// `value_field`, ...). The binding resolver collects these.
    pub binds_data: bool,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            required: true,
            field_type,
            default: None,
            element: None,
            binds_data: false,
        }
    }

    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            required: false,
            field_type,
            default: None,
            element: None,
            binds_data: false,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_element(mut self, element: Vec<FieldSpec>) -> Self {
        self.element = Some(element);
        self
    }

    pub fn data_bound(mut self) -> Self {
        self.binds_data = true;
        self
    }
}

/// Unknown-key policy for validation.
///
/// `Strict` rejects keys the schema does not declare; `Lenient` passes them
/// through inertly. The pipeline default is `Strict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    #[default]
    Strict,
    Lenient,
}

/// A validated, immutable plugin configuration.
///
/// Every required field is present and type-correct, defaults have been
/// applied for absent optional fields.
#[derive(Debug, Clone, Default)]
pub struct ValidatedConfig {
    values: Map<String, Value>,
}

impl ValidatedConfig {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str_value(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn f64_value(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }

    pub fn bool_value(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }

    pub fn array_value(&self, name: &str) -> Option<&Vec<Value>> {
        self.values.get(name).and_then(Value::as_array)
    }

    /// Required string field. Validation guarantees presence for required
    /// schema fields, so an error here indicates a schema/accessor mismatch.
    pub fn required_str(&self, name: &str) -> Result<&str, RenderError> {
        self.str_value(name).ok_or_else(|| {
            RenderError::Configuration(vec![FieldError::new(name, "missing required field")])
        })
    }

    pub fn required_f64(&self, name: &str) -> Result<f64, RenderError> {
        self.f64_value(name).ok_or_else(|| {
            RenderError::Configuration(vec![FieldError::new(name, "missing required field")])
        })
    }

    pub fn required_array(&self, name: &str) -> Result<&Vec<Value>, RenderError> {
        self.array_value(name).ok_or_else(|| {
            RenderError::Configuration(vec![FieldError::new(name, "missing required field")])
        })
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

/// Validate a raw params mapping against a plugin schema.
///
/// All field errors are collected before reporting: missing required fields,
/// type mismatches, bad array element shapes, and (in `Strict` mode) unknown
/// keys are reported simultaneously in one `RenderError::Configuration`.
pub fn validate(
    raw: &Map<String, Value>,
    schema: &[FieldSpec],
    strictness: Strictness,
) -> Result<ValidatedConfig, RenderError> {
    let mut errors = Vec::new();
    let mut values = Map::new();

    for spec in schema {
        match raw.get(&spec.name) {
            Some(value) => {
                check_value(&spec.name, value, spec, strictness, &mut errors);
                values.insert(spec.name.clone(), value.clone());
            }
            None if spec.required => {
                errors.push(FieldError::new(&spec.name, "missing required field"));
            }
            None => {
                if let Some(default) = &spec.default {
                    values.insert(spec.name.clone(), default.clone());
                }
            }
        }
    }

    if strictness == Strictness::Strict {
        for key in raw.keys() {
            if !schema.iter().any(|spec| spec.name == *key) {
                errors.push(FieldError::new(key, "unknown configuration key"));
            }
        }
    } else {
        // Lenient: pass unknown keys through inertly.
        for (key, value) in raw {
            if !schema.iter().any(|spec| spec.name == *key) {
                values.insert(key.clone(), value.clone());
            }
        }
    }

    if errors.is_empty() {
        Ok(ValidatedConfig { values })
    } else {
        Err(RenderError::Configuration(errors))
    }
}

fn check_value(
    path: &str,
    value: &Value,
    spec: &FieldSpec,
    strictness: Strictness,
    errors: &mut Vec<FieldError>,
) {
    if !spec.field_type.matches(value) {
        errors.push(FieldError::new(
            path,
            format!("expected a {}", spec.field_type.name()),
        ));
        return;
    }

    let (Some(element), Some(items)) = (&spec.element, value.as_array()) else {
        return;
    };

    for (index, item) in items.iter().enumerate() {
        let Some(item_map) = item.as_object() else {
            errors.push(FieldError::new(
                format!("{path}[{index}]"),
                "expected an object",
            ));
            continue;
        };
        for elem_spec in element {
            let elem_path = format!("{path}[{index}].{}", elem_spec.name);
            match item_map.get(&elem_spec.name) {
                Some(elem_value) => {
                    check_value(&elem_path, elem_value, elem_spec, strictness, errors);
                }
                None if elem_spec.required => {
                    errors.push(FieldError::new(elem_path, "missing required field"));
                }
                None => {}
            }
        }
        if strictness == Strictness::Strict {
            for key in item_map.keys() {
                if !element.iter().any(|spec| spec.name == *key) {
                    errors.push(FieldError::new(
                        format!("{path}[{index}].{key}"),
                        "unknown configuration key",
                    ));
                }
            }
        }
    }
}
