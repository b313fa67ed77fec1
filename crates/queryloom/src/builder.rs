use crate::cache::FetchCache;
use crate::error::EngineError;
use crate::loom::QueryLoom;
use crate::metrics::EngineMetrics;
use crate::registry::{PluginLoader, PluginRegistry};
use queryloom_types::{DatasourceStore, StaticDatasourceStore};
use std::sync::Arc;

const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Non-generic builder; accepts any loader implementing the async
/// `PluginLoader` port.
pub struct LoomBuilder {
    loader: Option<Arc<dyn PluginLoader>>,
    datasource_store: Option<Arc<dyn DatasourceStore>>,
    cache_capacity: usize,
}

impl Default for LoomBuilder {
    fn default() -> Self {
        Self {
            loader: None,
            datasource_store: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl LoomBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept any concrete loader that implements the PluginLoader trait.
    pub fn with_loader<L>(mut self, loader: L) -> Self
    where
        L: PluginLoader + 'static,
    {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Accept any concrete store that implements the DatasourceStore
    /// trait. Defaults to an empty in-memory store.
    pub fn with_datasource_store<S>(mut self, store: S) -> Self
    where
        S: DatasourceStore + 'static,
    {
        self.datasource_store = Some(Arc::new(store));
        self
    }

    /// Maximum number of cached query results.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn build(self) -> Result<QueryLoom, EngineError> {
        let loader = self.loader.ok_or_else(|| {
            EngineError::InvalidConfig("a plugin loader is required".to_string())
        })?;
        if self.cache_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "cache capacity must be at least 1".to_string(),
            ));
        }
        let datasource_store = self
            .datasource_store
            .unwrap_or_else(|| Arc::new(StaticDatasourceStore::new()));

        Ok(QueryLoom {
            registry: Arc::new(PluginRegistry::new(loader)),
            datasource_store,
            cache: Arc::new(FetchCache::new(self.cache_capacity)),
            metrics: EngineMetrics::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticPluginLoader;

    #[test]
    fn test_build_requires_a_loader() {
        let err = LoomBuilder::new().build().unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_build_rejects_zero_cache_capacity() {
        let err = LoomBuilder::new()
            .with_loader(StaticPluginLoader::new())
            .with_cache_capacity(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_build_with_defaults() {
        let loom = LoomBuilder::new()
            .with_loader(StaticPluginLoader::new())
            .build()
            .unwrap();
        assert_eq!(loom.cache_stats().capacity, DEFAULT_CACHE_CAPACITY);
    }
}
