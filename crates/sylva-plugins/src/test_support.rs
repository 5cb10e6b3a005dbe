//! Shared helpers for plugin tests

use std::sync::Arc;

use serde_json::Value;

use sylva_core::schema::{validate, Strictness};

use crate::plugin::{Plugin, PluginInputData, RenderContext};
use crate::theme::ThemeEngine;

/// Build a render context for `plugin`, validating `raw_params` against its
/// declared schema the way the orchestrator would.
pub(crate) fn context_for(
    plugin: &dyn Plugin,
    raw_params: Value,
    input: PluginInputData,
) -> RenderContext {
    let descriptor = plugin.descriptor();
    let raw = raw_params.as_object().cloned().unwrap_or_default();
    let config = validate(&raw, &descriptor.config_schema, Strictness::Strict)
        .expect("test params must satisfy the plugin schema");

    RenderContext {
        label: format!("widgets[0]:{}", descriptor.name),
        source: "test_source".to_string(),
        input,
        config,
        theme: Arc::new(ThemeEngine::new().expect("built-in templates must parse")),
    }
}
