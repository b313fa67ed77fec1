//! Query definitions submitted to the engine.

use serde::{Deserialize, Serialize};

/// Selects the datasource a query runs against. When `name` is absent the
/// default datasource registered for the kind applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceSelector {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DatasourceSelector {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: None,
        }
    }

    pub fn named(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: Some(name.into()),
        }
    }
}

/// How a query's results are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Evaluate over the full time range at a step interval.
    #[default]
    Range,
    /// Evaluate at a single instant.
    Instant,
}

impl QueryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Range => "range",
            QueryMode::Instant => "instant",
        }
    }
}

/// A single time-series query.
///
/// Queries are identified by their position in the submitted list. `spec`
/// is opaque to the engine and interpreted by the plugin registered for
/// `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesQueryDefinition {
    pub kind: String,
    pub spec: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<DatasourceSelector>,
}

impl TimeSeriesQueryDefinition {
    pub fn new(kind: impl Into<String>, spec: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            spec,
            datasource: None,
        }
    }

    pub fn with_datasource(mut self, datasource: DatasourceSelector) -> Self {
        self.datasource = Some(datasource);
        self
    }
}
