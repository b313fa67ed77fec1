//! Run orchestration: plan, fetch, publish, repeat until quiescent.

use crate::cache::FetchCache;
use crate::context::{FetchContext, QueryContext};
use crate::dependency::DependencyMap;
use crate::loom::{QueryResult, QueryStatus, RunOutcome};
use crate::metrics::EngineMetrics;
use crate::plan::QueryPlan;
use crate::registry::PluginRegistry;
use crate::results::ResolvedResults;
use queryloom_types::{DatasourceStore, QueryError, TimeSeriesData, TimeSeriesQueryDefinition};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Whether a run may serve results from the fetch cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FetchPolicy {
    /// Serve cached results when the cache key matches.
    CacheFirst,
    /// Skip cache reads and fetch everything again. Fresh results still
    /// land in the cache.
    BypassCache,
}

/// Mutable per-query state while a run is in flight.
struct Slot {
    status: QueryStatus,
    data: Option<Arc<TimeSeriesData>>,
    error: Option<QueryError>,
    from_cache: bool,
    /// Cache key the in-flight fetch was planned under. Completions are
    /// only applied when they still match.
    planned_key: Option<String>,
}

impl Slot {
    fn new() -> Self {
        Self {
            status: QueryStatus::Pending,
            data: None,
            error: None,
            from_cache: false,
            planned_key: None,
        }
    }

    fn needs_planning(&self) -> bool {
        !matches!(
            self.status,
            QueryStatus::Fetching | QueryStatus::Resolved | QueryStatus::Failed
        )
    }
}

struct FetchOutcome {
    query_index: usize,
    cache_key: String,
    result: Result<TimeSeriesData, QueryError>,
}

/// Drives one resolution run to quiescence.
///
/// Fetches are spawned onto a [`JoinSet`], so independent queries run
/// concurrently while dependent queries serialize through the readiness
/// gate. Dropping the returned future drops the set and aborts every
/// in-flight fetch.
pub(crate) struct QueryRunner {
    registry: Arc<PluginRegistry>,
    datasource_store: Arc<dyn DatasourceStore>,
    cache: Arc<FetchCache>,
    metrics: EngineMetrics,
    policy: FetchPolicy,
}

impl QueryRunner {
    pub fn new(
        registry: Arc<PluginRegistry>,
        datasource_store: Arc<dyn DatasourceStore>,
        cache: Arc<FetchCache>,
        metrics: EngineMetrics,
        policy: FetchPolicy,
    ) -> Self {
        Self {
            registry,
            datasource_store,
            cache,
            metrics,
            policy,
        }
    }

    pub async fn run(
        &self,
        definitions: &[TimeSeriesQueryDefinition],
        context: &QueryContext,
    ) -> RunOutcome {
        let plugins = self.registry.load_for(definitions).await;
        let mut slots: Vec<Slot> = definitions.iter().map(|_| Slot::new()).collect();
        let mut resolved = ResolvedResults::new();
        let mut fingerprint = resolved.fingerprint();
        let mut fetches: JoinSet<FetchOutcome> = JoinSet::new();

        loop {
            // depends_on may read variable state or specs that changed
            // meaning between passes, so the map is rebuilt per pass.
            let deps = DependencyMap::from_definitions(definitions, &plugins, context);

            let mut cache_progress = false;
            for idx in 0..definitions.len() {
                if !slots[idx].needs_planning() {
                    continue;
                }

                let plan = QueryPlan::build(
                    idx,
                    &definitions[idx],
                    plugins[idx].as_ref(),
                    context,
                    &deps,
                    &resolved,
                );
                slots[idx].status = plan.status;
                if !plan.enabled {
                    continue;
                }

                if let Some(cycle) = plan.cycle {
                    warn!(query = idx, path = %cycle, "circular dependency detected");
                    self.metrics.inc_cycles_detected();
                    slots[idx].status = QueryStatus::Failed;
                    slots[idx].error = Some(QueryError::CircularDependency {
                        path: cycle.to_string(),
                    });
                    continue;
                }

                if self.policy == FetchPolicy::CacheFirst {
                    if let Some(data) = self.cache.get(&plan.cache_key) {
                        debug!(query = idx, "served from cache");
                        self.metrics.inc_cache_hits();
                        slots[idx].status = QueryStatus::Resolved;
                        slots[idx].data = Some(data);
                        slots[idx].from_cache = true;
                        cache_progress = true;
                        continue;
                    }
                }

                let Some(plugin) = plugins[idx].clone() else {
                    continue;
                };
                let key = plan.cache_key;
                slots[idx].status = QueryStatus::Fetching;
                slots[idx].planned_key = Some(key.clone());
                self.metrics.inc_fetches_started();
                debug!(query = idx, "fetch started");

                let spec = definitions[idx].spec.clone();
                let fetch_ctx = FetchContext::new(
                    context,
                    self.datasource_store.clone(),
                    idx,
                    resolved.clone(),
                );
                fetches.spawn(async move {
                    let result = plugin.get_time_series_data(&spec, &fetch_ctx).await;
                    FetchOutcome {
                        query_index: idx,
                        cache_key: key,
                        result,
                    }
                });
            }

            // Publish newly resolved data before dependents re-plan.
            self.refresh_resolved(&mut resolved, &mut fingerprint, &slots);
            if cache_progress {
                continue;
            }

            match fetches.join_next().await {
                Some(Ok(outcome)) => {
                    self.apply_completion(&mut slots, outcome);
                    self.refresh_resolved(&mut resolved, &mut fingerprint, &slots);
                }
                Some(Err(join_error)) => {
                    // A panicking plugin is a bug in the plugin; surface it.
                    if join_error.is_panic() {
                        std::panic::resume_unwind(join_error.into_panic());
                    }
                }
                // Nothing in flight and the pass made no progress: every
                // remaining query is blocked for good.
                None => break,
            }
        }

        let results = definitions
            .iter()
            .cloned()
            .zip(slots)
            .map(|(definition, slot)| QueryResult {
                definition,
                status: slot.status,
                data: slot.data,
                error: slot.error,
                from_cache: slot.from_cache,
            })
            .collect();
        RunOutcome { results }
    }

    /// Rebuild the resolved snapshot from the slots, publishing it only
    /// when its fingerprint changed. The snapshot is replaced wholesale;
    /// in-flight fetches keep reading the one they were spawned with.
    fn refresh_resolved(
        &self,
        resolved: &mut ResolvedResults,
        fingerprint: &mut String,
        slots: &[Slot],
    ) {
        let candidate = ResolvedResults::from_slots(slots.iter().map(|s| s.data.as_ref()));
        let candidate_fingerprint = candidate.fingerprint();
        if candidate_fingerprint != *fingerprint {
            debug!(fingerprint = %candidate_fingerprint, "resolved results updated");
            *resolved = candidate;
            *fingerprint = candidate_fingerprint;
        }
    }

    fn apply_completion(&self, slots: &mut [Slot], outcome: FetchOutcome) {
        let slot = &mut slots[outcome.query_index];
        let still_planned = slot.status == QueryStatus::Fetching
            && slot.planned_key.as_deref() == Some(outcome.cache_key.as_str());
        if !still_planned {
            debug!(
                query = outcome.query_index,
                "ignoring completion for a superseded plan"
            );
            return;
        }

        match outcome.result {
            Ok(data) => {
                let data = Arc::new(data);
                self.cache.put(outcome.cache_key, data.clone());
                self.metrics.inc_fetches_completed();
                debug!(
                    query = outcome.query_index,
                    series = data.series_count(),
                    "query resolved"
                );
                slot.status = QueryStatus::Resolved;
                slot.data = Some(data);
                slot.error = None;
            }
            Err(error) => {
                self.metrics.inc_fetches_failed();
                warn!(query = outcome.query_index, %error, "query fetch failed");
                slot.status = QueryStatus::Failed;
                slot.error = Some(error);
            }
        }
    }
}
