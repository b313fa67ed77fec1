//! Query plugin traits.
//!
//! This module defines the core plugin abstraction that allows plugging in
//! different query backends (Prometheus-style HTTP APIs, in-process
//! computations over other queries, fixtures for tests, ...).

use crate::context::{FetchContext, QueryContext};
use async_trait::async_trait;
use queryloom_types::{QueryError, TimeSeriesData};
use std::fmt;

/// Dependencies a plugin reports for one query spec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginDependencies {
    /// Indices of other queries whose results this query reads.
    pub queries: Vec<usize>,
    /// Names of the variables this query interpolates. `None` means
    /// undeclared: the query is keyed on every variable and never waits
    /// for loading ones.
    pub variables: Option<Vec<String>>,
}

impl PluginDependencies {
    pub fn on_queries(queries: Vec<usize>) -> Self {
        Self {
            queries,
            variables: None,
        }
    }

    pub fn on_variables(variables: Vec<String>) -> Self {
        Self {
            queries: Vec::new(),
            variables: Some(variables),
        }
    }

    pub fn with_variables(mut self, variables: Vec<String>) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// Async query plugin port.
///
/// Implement this trait to execute queries of one kind. Results from
/// upstream queries a plugin declared via [`depends_on`] are available on
/// the fetch context.
///
/// [`depends_on`]: TimeSeriesQueryPlugin::depends_on
///
/// # Example
/// ```ignore
/// use queryloom::plugin::{PluginDependencies, TimeSeriesQueryPlugin};
/// use queryloom::context::FetchContext;
/// use queryloom_types::{QueryError, TimeSeriesData};
/// use async_trait::async_trait;
///
/// struct StaticPlugin {
///     data: TimeSeriesData,
/// }
///
/// #[async_trait]
/// impl TimeSeriesQueryPlugin for StaticPlugin {
///     async fn get_time_series_data(
///         &self,
///         _spec: &serde_json::Value,
///         _ctx: &FetchContext,
///     ) -> Result<TimeSeriesData, QueryError> {
///         Ok(self.data.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait TimeSeriesQueryPlugin: Send + Sync + 'static {
    /// Execute the query and return its data.
    async fn get_time_series_data(
        &self,
        spec: &serde_json::Value,
        ctx: &FetchContext,
    ) -> Result<TimeSeriesData, QueryError>;

    /// Optional: report which queries and variables this spec reads.
    ///
    /// Called while planning, before any fetch. Default: no dependencies.
    fn depends_on(&self, _spec: &serde_json::Value, _ctx: &QueryContext) -> PluginDependencies {
        PluginDependencies::default()
    }
}

impl fmt::Debug for dyn TimeSeriesQueryPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn TimeSeriesQueryPlugin")
    }
}
