//! The [`QueryLoom`] facade: configured capabilities plus the run entry
//! points.

use crate::builder::LoomBuilder;
use crate::cache::{CacheStats, FetchCache};
use crate::context::QueryContext;
use crate::metrics::EngineMetrics;
use crate::registry::PluginRegistry;
use crate::runner::{FetchPolicy, QueryRunner};
use queryloom_types::{DatasourceStore, QueryError, TimeSeriesData, TimeSeriesQueryDefinition};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Where a query stands in its lifecycle.
///
/// `Ready` and `Fetching` are transient; a finished run reports each
/// query as `Resolved`, `Failed`, or one of the wait states it could not
/// leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// The plugin for the query's kind is missing or failed to load.
    Pending,
    /// A variable the query declared is still loading.
    WaitingOnVariables,
    /// At least one external dependency has no resolved result.
    WaitingOnDependencies,
    /// Every gate passed; the fetch may start.
    Ready,
    /// A fetch is in flight.
    Fetching,
    /// The query has data.
    Resolved,
    /// The fetch failed, or a dependency cycle was detected.
    Failed,
}

impl QueryStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryStatus::Resolved | QueryStatus::Failed)
    }
}

/// Final state of one query after a run, index-aligned with the
/// submitted definitions.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub definition: TimeSeriesQueryDefinition,
    pub status: QueryStatus,
    pub data: Option<Arc<TimeSeriesData>>,
    pub error: Option<QueryError>,
    /// Whether `data` was served from the fetch cache.
    pub from_cache: bool,
}

impl QueryResult {
    pub fn is_resolved(&self) -> bool {
        self.status == QueryStatus::Resolved
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    pub results: Vec<QueryResult>,
}

impl RunOutcome {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, query: usize) -> Option<&QueryResult> {
        self.results.get(query)
    }

    pub fn resolved_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_resolved()).count()
    }

    pub fn all_resolved(&self) -> bool {
        self.results.iter().all(|r| r.is_resolved())
    }
}

/// Dependency-resolving executor for time-series queries.
///
/// Queries may read each other's results through their plugin's
/// `depends_on` hook; the loom resolves them in dependency order, runs
/// independent fetches concurrently, fails dependency cycles fast, and
/// caches results under content-addressed keys.
///
/// # Example
/// ```ignore
/// use queryloom::prelude::*;
///
/// let loader = StaticPluginLoader::new();
/// loader.register("prometheus", MyPrometheusPlugin::new());
///
/// let loom = QueryLoom::builder().with_loader(loader).build()?;
/// let outcome = loom.run(&definitions, &context).await;
/// for result in &outcome.results {
///     println!("{:?}: {:?}", result.status, result.data);
/// }
/// ```
pub struct QueryLoom {
    pub(crate) registry: Arc<PluginRegistry>,
    pub(crate) datasource_store: Arc<dyn DatasourceStore>,
    pub(crate) cache: Arc<FetchCache>,
    pub(crate) metrics: EngineMetrics,
}

impl fmt::Debug for QueryLoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryLoom").finish_non_exhaustive()
    }
}

impl QueryLoom {
    pub fn builder() -> LoomBuilder {
        LoomBuilder::new()
    }

    /// Resolve all queries, serving unchanged ones from the cache.
    pub async fn run(
        &self,
        definitions: &[TimeSeriesQueryDefinition],
        context: &QueryContext,
    ) -> RunOutcome {
        self.execute(definitions, context, FetchPolicy::CacheFirst)
            .await
    }

    /// Resolve all queries, fetching fresh data even where cached
    /// results exist. Fresh results replace the cached entries.
    pub async fn refetch_all(
        &self,
        definitions: &[TimeSeriesQueryDefinition],
        context: &QueryContext,
    ) -> RunOutcome {
        self.execute(definitions, context, FetchPolicy::BypassCache)
            .await
    }

    async fn execute(
        &self,
        definitions: &[TimeSeriesQueryDefinition],
        context: &QueryContext,
        policy: FetchPolicy,
    ) -> RunOutcome {
        self.metrics.inc_runs();
        let runner = QueryRunner::new(
            self.registry.clone(),
            self.datasource_store.clone(),
            self.cache.clone(),
            self.metrics.clone(),
            policy,
        );
        let outcome = runner.run(definitions, context).await;
        debug!(
            queries = definitions.len(),
            resolved = outcome.resolved_count(),
            "run finished"
        );
        outcome
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
