//! Plugin loading and the kind-keyed registry.

use crate::plugin::TimeSeriesQueryPlugin;
use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use queryloom_types::{QueryError, TimeSeriesQueryDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Loads the plugin implementation for a query kind.
///
/// Implementations may fetch plugin bundles lazily; the registry caches
/// whatever they return, so each kind is loaded at most once.
#[async_trait]
pub trait PluginLoader: Send + Sync + 'static {
    async fn load(&self, kind: &str) -> Result<Arc<dyn TimeSeriesQueryPlugin>, QueryError>;
}

/// Loader over a fixed set of programmatically registered plugins.
#[derive(Default)]
pub struct StaticPluginLoader {
    plugins: DashMap<String, Arc<dyn TimeSeriesQueryPlugin>>,
}

impl StaticPluginLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P>(&self, kind: impl Into<String>, plugin: P)
    where
        P: TimeSeriesQueryPlugin,
    {
        self.plugins.insert(kind.into(), Arc::new(plugin));
    }
}

#[async_trait]
impl PluginLoader for StaticPluginLoader {
    async fn load(&self, kind: &str) -> Result<Arc<dyn TimeSeriesQueryPlugin>, QueryError> {
        self.plugins
            .get(kind)
            .map(|p| p.value().clone())
            .ok_or_else(|| QueryError::PluginLoad {
                kind: kind.to_string(),
                reason: "kind not registered".to_string(),
            })
    }
}

/// Kind-keyed plugin registry with load-once caching.
pub struct PluginRegistry {
    loader: Arc<dyn PluginLoader>,
    loaded: DashMap<String, Arc<dyn TimeSeriesQueryPlugin>>,
}

impl PluginRegistry {
    pub fn new(loader: Arc<dyn PluginLoader>) -> Self {
        Self {
            loader,
            loaded: DashMap::new(),
        }
    }

    /// Plugin for `kind`, loading it on first use.
    pub async fn get(&self, kind: &str) -> Result<Arc<dyn TimeSeriesQueryPlugin>, QueryError> {
        if let Some(plugin) = self.loaded.get(kind) {
            return Ok(plugin.value().clone());
        }
        let plugin = self.loader.load(kind).await?;
        debug!(kind, "plugin loaded");
        self.loaded.insert(kind.to_string(), plugin.clone());
        Ok(plugin)
    }

    /// Load the plugin for every definition, deduplicating kinds.
    ///
    /// The returned vector is index-aligned with `definitions`. A failed
    /// load is logged and leaves `None` for the affected definitions.
    pub async fn load_for(
        &self,
        definitions: &[TimeSeriesQueryDefinition],
    ) -> Vec<Option<Arc<dyn TimeSeriesQueryPlugin>>> {
        let mut kinds: Vec<&str> = definitions.iter().map(|d| d.kind.as_str()).collect();
        kinds.sort_unstable();
        kinds.dedup();

        let loads = join_all(kinds.iter().map(|kind| self.get(kind))).await;

        let mut by_kind: HashMap<&str, Arc<dyn TimeSeriesQueryPlugin>> = HashMap::new();
        for (kind, result) in kinds.into_iter().zip(loads) {
            match result {
                Ok(plugin) => {
                    by_kind.insert(kind, plugin);
                }
                Err(error) => warn!(kind, %error, "failed to load query plugin"),
            }
        }

        definitions
            .iter()
            .map(|d| by_kind.get(d.kind.as_str()).cloned())
            .collect()
    }
}
