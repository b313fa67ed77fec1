//! Datasource lookup capability threaded through query contexts.

use crate::error::QueryError;
use crate::query::DatasourceSelector;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Resolves datasource selectors to their configuration payload.
///
/// The engine never interprets the payload; plugins build their own
/// clients from it.
#[async_trait]
pub trait DatasourceStore: Send + Sync + 'static {
    /// Configuration for the selected datasource.
    async fn get_datasource(
        &self,
        selector: &DatasourceSelector,
    ) -> Result<serde_json::Value, QueryError>;
}

/// In-memory datasource store keyed by kind and optional name.
#[derive(Default)]
pub struct StaticDatasourceStore {
    entries: RwLock<HashMap<String, serde_json::Value>>,
}

impl StaticDatasourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, selector: DatasourceSelector, config: serde_json::Value) {
        let mut entries = self.entries.write().unwrap();
        entries.insert(Self::entry_key(&selector), config);
    }

    fn entry_key(selector: &DatasourceSelector) -> String {
        match &selector.name {
            Some(name) => format!("{}/{}", selector.kind, name),
            None => selector.kind.clone(),
        }
    }
}

#[async_trait]
impl DatasourceStore for StaticDatasourceStore {
    async fn get_datasource(
        &self,
        selector: &DatasourceSelector,
    ) -> Result<serde_json::Value, QueryError> {
        let entries = self.entries.read().unwrap();
        entries
            .get(&Self::entry_key(selector))
            .cloned()
            .ok_or_else(|| QueryError::DatasourceNotFound {
                kind: selector.kind.clone(),
            })
    }
}
