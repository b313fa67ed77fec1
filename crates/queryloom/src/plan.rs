//! Per-query fetch planning: wait states, enablement, cache keys.

use crate::context::QueryContext;
use crate::cycle::{CyclePath, detect_cycle};
use crate::dependency::DependencyMap;
use crate::loom::QueryStatus;
use crate::plugin::TimeSeriesQueryPlugin;
use crate::results::{ResolvedResults, dependency_fingerprint};
use queryloom_types::TimeSeriesQueryDefinition;
use std::fmt::Write;
use std::sync::Arc;

/// Cache key namespace for time-series queries.
pub(crate) const TIME_SERIES_QUERY_KEY: &str = "TimeSeriesQuery";

/// One query's fetch plan for the current pass.
#[derive(Debug)]
pub(crate) struct QueryPlan {
    /// Whether the fetch may run now.
    pub enabled: bool,
    /// Wait state explaining a disabled plan; `Ready` when enabled.
    pub status: QueryStatus,
    pub cache_key: String,
    /// Set when the dependency walk found a cycle. The query is still
    /// enabled so it can fail fast instead of waiting forever, but the
    /// plugin is never invoked.
    pub cycle: Option<CyclePath>,
}

impl QueryPlan {
    pub fn build(
        query_index: usize,
        definition: &TimeSeriesQueryDefinition,
        plugin: Option<&Arc<dyn TimeSeriesQueryPlugin>>,
        context: &QueryContext,
        deps: &DependencyMap,
        resolved: &ResolvedResults,
    ) -> Self {
        let plugin_loaded = plugin.is_some();

        // Declared variables gate the fetch while loading; undeclared
        // variables never do.
        let variable_deps = deps.variables(query_index);
        let wait_to_load = variable_deps
            .map(|names| context.variable_state.names_loading(names))
            .unwrap_or(false);

        let has_deps = deps.has_dependencies(query_index);
        let cycle = if has_deps {
            detect_cycle(query_index, deps)
        } else {
            None
        };
        let deps_resolved = cycle.is_some() || deps.is_ready(query_index, resolved);

        let enabled = plugin_loaded && !wait_to_load && deps_resolved;
        let status = if !plugin_loaded {
            QueryStatus::Pending
        } else if wait_to_load {
            QueryStatus::WaitingOnVariables
        } else if !deps_resolved {
            QueryStatus::WaitingOnDependencies
        } else {
            QueryStatus::Ready
        };

        let cache_key = cache_key(
            query_index,
            definition,
            context,
            deps,
            resolved,
            variable_deps,
            has_deps,
        );

        Self {
            enabled,
            status,
            cache_key,
            cycle,
        }
    }
}

/// Assemble the content-addressed cache key for one query.
///
/// The key covers everything that makes a result reusable: the definition
/// itself, the time range, the values of the variables the query reads,
/// the step and mode, the query's position, and (for dependent queries)
/// the fingerprint of its upstream data. A dependent therefore refetches
/// exactly when an ingredient changes, and results produced for a
/// superseded plan land under keys nothing reads anymore.
fn cache_key(
    query_index: usize,
    definition: &TimeSeriesQueryDefinition,
    context: &QueryContext,
    deps: &DependencyMap,
    resolved: &ResolvedResults,
    variable_deps: Option<&[String]>,
    has_deps: bool,
) -> String {
    let definition_hash = serde_json::to_vec(definition)
        .map(|bytes| seahash::hash(&bytes))
        .unwrap_or(0);
    let values_key = context.variable_state.filter(variable_deps).values_key();
    let values_hash = seahash::hash(values_key.as_bytes());
    let step = context
        .suggested_step_ms
        .map(|s| s.to_string())
        .unwrap_or_else(|| "null".to_string());

    let mut key = format!(
        "query/{}/{:016x}/{}-{}/v{:016x}/{}/{}/q{}",
        TIME_SERIES_QUERY_KEY,
        definition_hash,
        context.time_range.start_ms(),
        context.time_range.end_ms(),
        values_hash,
        step,
        context.mode.as_str(),
        query_index,
    );
    if has_deps {
        let fingerprint = dependency_fingerprint(resolved, deps, query_index);
        let _ = write!(key, "/deps/{}", fingerprint);
    }
    key
}
