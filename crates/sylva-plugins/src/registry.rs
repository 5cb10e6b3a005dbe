//! Plugin registry for managing available plugins

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use sylva_core::error::RenderError;
use sylva_core::site_config::PluginKind;

use crate::plugin::{Plugin, PluginDescriptor};

/// Registry mapping `(kind, name)` to a plugin implementation.
///
/// Thread-safe and async-compatible using tokio's RwLock. Registration runs
/// once at startup; during an export run the registry is only read, so
/// multiple entries (and concurrent runs) resolve plugins without blocking
/// each other.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Arc<RwLock<HashMap<(PluginKind, String), Arc<dyn Plugin>>>>,
}

impl PluginRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under its declared `(kind, name)`.
    ///
    /// Fails with `DuplicateRegistration` if the slot is taken; the first
    /// registration remains active. Registration order must not silently
    /// overwrite.
    pub async fn register(&self, plugin: Arc<dyn Plugin>) -> Result<(), RenderError> {
        let descriptor = plugin.descriptor();
        let key = (descriptor.kind, descriptor.name.clone());

        let mut plugins = self.plugins.write().await;
        if plugins.contains_key(&key) {
            return Err(RenderError::DuplicateRegistration {
                kind: descriptor.kind,
                name: descriptor.name,
            });
        }

        tracing::debug!(kind = %descriptor.kind, name = %descriptor.name, "registered plugin");
        plugins.insert(key, plugin);
        Ok(())
    }

    /// Resolve a plugin by kind and name.
    ///
    /// This is the only way the rest of the system discovers a plugin; no
    /// direct construction bypasses the registry.
    pub async fn resolve(&self, kind: PluginKind, name: &str) -> Result<Arc<dyn Plugin>, RenderError> {
        let plugins = self.plugins.read().await;
        plugins
            .get(&(kind, name.to_string()))
            .cloned()
            .ok_or_else(|| RenderError::UnknownPlugin {
                kind,
                name: name.to_string(),
            })
    }

    /// Check if a plugin is registered
    pub async fn contains(&self, kind: PluginKind, name: &str) -> bool {
        let plugins = self.plugins.read().await;
        plugins.contains_key(&(kind, name.to_string()))
    }

    /// List all registered plugin descriptors, sorted by kind then name.
    pub async fn list(&self) -> Vec<PluginDescriptor> {
        let plugins = self.plugins.read().await;
        let mut descriptors: Vec<_> = plugins.values().map(|p| p.descriptor()).collect();
        descriptors.sort_by(|a, b| {
            (a.kind.to_string(), &a.name).cmp(&(b.kind.to_string(), &b.name))
        });
        descriptors
    }
}

/// Register the built-in widget and exporter roster.
///
/// Discovery runs once at process start; registering into a registry that
/// already holds a built-in name is an error like any other duplicate.
pub async fn register_builtins(registry: &PluginRegistry) -> Result<(), RenderError> {
    let builtins: Vec<Arc<dyn Plugin>> = vec![
        Arc::new(crate::widgets::BarPlot),
        Arc::new(crate::widgets::DonutChart),
        Arc::new(crate::widgets::RadialGauge),
        Arc::new(crate::widgets::InfoGrid),
        Arc::new(crate::widgets::InteractiveMap),
        Arc::new(crate::exporters::JsonExporter),
        Arc::new(crate::exporters::CsvExporter),
    ];
    for plugin in builtins {
        registry.register(plugin).await?;
    }
    Ok(())
}

/// Convenience: a fresh registry populated with the built-in roster.
pub async fn builtin_registry() -> Result<PluginRegistry, RenderError> {
    let registry = PluginRegistry::new();
    register_builtins(&registry).await?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::RenderContext;
    use async_trait::async_trait;
    use sylva_core::dataset::DataShape;
    use sylva_core::RenderResult;

    // Mock plugin for testing
    #[derive(Debug)]
    struct MockPlugin {
        name: String,
        kind: PluginKind,
    }

    impl MockPlugin {
        fn widget(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                kind: PluginKind::Widget,
            }
        }

        fn exporter(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                kind: PluginKind::Exporter,
            }
        }
    }

    #[async_trait]
    impl Plugin for MockPlugin {
        fn descriptor(&self) -> PluginDescriptor {
            PluginDescriptor::new(
                self.name.clone(),
                self.kind,
                DataShape::Record,
                "mock plugin",
                Vec::new(),
            )
        }

        async fn render(&self, _ctx: RenderContext) -> Result<Vec<RenderResult>, RenderError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn new_registry_is_empty() {
        let registry = PluginRegistry::new();
        assert!(registry.list().await.is_empty());
        assert!(!registry.contains(PluginKind::Widget, "bar_plot").await);
    }

    #[tokio::test]
    async fn register_and_resolve_plugin() {
        let registry = PluginRegistry::new();
        registry
            .register(Arc::new(MockPlugin::widget("bar_plot")))
            .await
            .unwrap();

        let plugin = registry.resolve(PluginKind::Widget, "bar_plot").await.unwrap();
        assert_eq!(plugin.descriptor().name, "bar_plot");
    }

    #[tokio::test]
    async fn duplicate_registration_fails_and_first_stays_active() {
        let registry = PluginRegistry::new();
        registry
            .register(Arc::new(MockPlugin::widget("bar_plot")))
            .await
            .unwrap();

        let err = registry
            .register(Arc::new(MockPlugin::widget("bar_plot")))
            .await
            .unwrap_err();
        assert_eq!(err.kind_name(), "duplicate_registration");
        assert!(err.to_string().contains("bar_plot"));

        // first registration still resolvable
        assert!(registry.contains(PluginKind::Widget, "bar_plot").await);
        assert_eq!(registry.list().await.len(), 1);
    }

    #[tokio::test]
    async fn same_name_under_different_kind_is_not_a_duplicate() {
        let registry = PluginRegistry::new();
        registry
            .register(Arc::new(MockPlugin::widget("dump")))
            .await
            .unwrap();
        registry
            .register(Arc::new(MockPlugin::exporter("dump")))
            .await
            .unwrap();
        assert_eq!(registry.list().await.len(), 2);
    }

    #[tokio::test]
    async fn resolving_unknown_plugin_fails() {
        let registry = PluginRegistry::new();
        let err = registry
            .resolve(PluginKind::Widget, "nonexistent")
            .await
            .unwrap_err();
        assert_eq!(err.kind_name(), "unknown_plugin");
        assert!(err.to_string().contains("nonexistent"));
    }

    #[tokio::test]
    async fn builtin_roster_registers_once() {
        let registry = builtin_registry().await.unwrap();
        assert!(registry.contains(PluginKind::Widget, "bar_plot").await);
        assert!(registry.contains(PluginKind::Widget, "interactive_map").await);
        assert!(registry.contains(PluginKind::Exporter, "json_exporter").await);
        assert!(registry.contains(PluginKind::Exporter, "csv_exporter").await);

        // discovery is one-shot; a second pass over the same registry is a
        // duplicate like any other
        let err = register_builtins(&registry).await.unwrap_err();
        assert_eq!(err.kind_name(), "duplicate_registration");
    }
}
