//! Theme engine for widget HTML fragments
//!
//! Thin wrapper over Tera. The built-in fragment templates are registered as
//! raw templates at construction, so no template directory is required; a
//! site can still layer its own templates on top through `add_template`.
//! Chart data is embedded as a JSON `<script>` block the front-end chart
//! layer reads; drawing pixels is out of scope here.

use tera::Tera;
use tracing::debug;

use sylva_core::error::RenderError;

/// Built-in fragment templates, registered under these names.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "widgets/chart.html",
        r#"<div class="widget widget-{{ chart_kind }}">
{%- if title %}
  <h3 class="widget-title">{{ title }}</h3>
{%- endif %}
  <div class="chart" data-chart="{{ chart_kind }}"></div>
  <script type="application/json">{{ spec | json_encode() | safe }}</script>
</div>
"#,
    ),
    (
        "widgets/radial_gauge.html",
        r#"<div class="widget widget-gauge">
{%- if title %}
  <h3 class="widget-title">{{ title }}</h3>
{%- endif %}
  <div class="gauge" data-chart="gauge"></div>
  <script type="application/json">{{ spec | json_encode() | safe }}</script>
{%- if spec.value is number %}
  <p class="gauge-value">{{ spec.value | format_number }}{% if spec.units %} {{ spec.units }}{% endif %}</p>
{%- else %}
  <p class="gauge-value gauge-value-missing">&mdash;</p>
{%- endif %}
</div>
"#,
    ),
    (
        "widgets/info_grid.html",
        r#"<div class="widget widget-info-grid">
{%- if title %}
  <h3 class="widget-title">{{ title }}</h3>
{%- endif %}
  <dl class="info-grid">
{%- for row in rows %}
    <dt>{{ row.label }}</dt>
    {%- if row.format == "number" and row.value is number %}
    <dd>{{ row.value | format_number }}</dd>
    {%- else %}
    <dd>{{ row.value }}</dd>
    {%- endif %}
{%- endfor %}
  </dl>
</div>
"#,
    ),
    (
        "widgets/interactive_map.html",
        r#"<div class="widget widget-map">
{%- if title %}
  <h3 class="widget-title">{{ title }}</h3>
{%- endif %}
  <div class="map" data-map-layer="{{ layer_path }}"></div>
  <script type="application/json">{{ spec | json_encode() | safe }}</script>
</div>
"#,
    ),
];

/// Template engine for rendering widget fragments.
pub struct ThemeEngine {
    tera: Tera,
}

impl ThemeEngine {
    /// Create an engine with the built-in fragment templates and filters.
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        Self::register_filters(&mut tera);
        for (name, body) in BUILTIN_TEMPLATES {
            tera.add_raw_template(name, body)
                .map_err(|e| RenderError::Template {
                    template: (*name).to_string(),
                    message: e.to_string(),
                })?;
        }
        debug!(count = BUILTIN_TEMPLATES.len(), "registered built-in templates");
        Ok(Self { tera })
    }

    /// Create an engine with no templates (for testing).
    pub fn empty() -> Self {
        let mut tera = Tera::default();
        Self::register_filters(&mut tera);
        Self { tera }
    }

    fn register_filters(tera: &mut Tera) {
        // Thousands-grouped number formatting for grid/gauge values
        tera.register_filter(
            "format_number",
            |value: &tera::Value, _args: &std::collections::HashMap<String, tera::Value>| {
                let formatted = match value {
                    tera::Value::Number(n) => {
                        if let Some(i) = n.as_i64() {
                            group_thousands(i)
                        } else {
                            n.as_f64()
                                .map(|f| format!("{f:.1}"))
                                .unwrap_or_else(|| n.to_string())
                        }
                    }
                    other => return Ok(other.clone()),
                };
                Ok(tera::Value::String(formatted))
            },
        );
    }

    /// Register or replace a template at runtime (site-supplied overrides).
    pub fn add_template(&mut self, name: &str, body: &str) -> Result<(), RenderError> {
        self.tera
            .add_raw_template(name, body)
            .map_err(|e| RenderError::Template {
                template: name.to_string(),
                message: e.to_string(),
            })
    }

    /// Render a template with bound variables.
    pub fn render(&self, template: &str, context: &tera::Context) -> Result<String, RenderError> {
        self.tera
            .render(template, context)
            .map_err(|e| RenderError::Template {
                template: template.to_string(),
                message: flatten_tera_error(&e),
            })
    }
}

/// Tera nests the useful message in the error source chain.
fn flatten_tera_error(err: &tera::Error) -> String {
    use std::error::Error;

    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    let lead = digits.len() % 3;
    for (index, ch) in digits.chars().enumerate() {
        if index != 0 && index % 3 == lead % 3 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chart_template_embeds_spec_as_json() {
        let theme = ThemeEngine::new().unwrap();
        let mut ctx = tera::Context::new();
        ctx.insert("chart_kind", "bar");
        ctx.insert("title", "DBH distribution");
        ctx.insert("spec", &json!({"pairs": [{"x": 0, "y": 5}]}));

        let html = theme.render("widgets/chart.html", &ctx).unwrap();
        assert!(html.contains("<h3 class=\"widget-title\">DBH distribution</h3>"));
        assert!(html.contains(r#"data-chart="bar""#));
        assert!(html.contains(r#""pairs":[{"x":0,"y":5}]"#));
    }

    #[test]
    fn missing_template_is_a_template_error() {
        let theme = ThemeEngine::empty();
        let err = theme
            .render("widgets/chart.html", &tera::Context::new())
            .unwrap_err();
        assert_eq!(err.kind_name(), "template");
    }

    #[test]
    fn format_number_groups_thousands() {
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(-1_000), "-1,000");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(0), "0");
    }

    #[test]
    fn title_block_is_omitted_when_absent() {
        let theme = ThemeEngine::new().unwrap();
        let mut ctx = tera::Context::new();
        ctx.insert("chart_kind", "donut");
        ctx.insert("title", &tera::Value::Null);
        ctx.insert("spec", &json!({}));

        let html = theme.render("widgets/chart.html", &ctx).unwrap();
        assert!(!html.contains("widget-title"));
    }
}
