//! Contexts handed to plugins while planning and fetching.

use crate::results::ResolvedResults;
use queryloom_types::{
    AbsoluteTimeRange, DatasourceStore, QueryMode, TimeSeriesData, VariableStateMap,
};
use std::sync::Arc;

/// Caller-supplied context shared by every query in one resolution run.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub time_range: AbsoluteTimeRange,
    pub variable_state: VariableStateMap,
    pub suggested_step_ms: Option<u64>,
    pub mode: QueryMode,
}

impl QueryContext {
    pub fn new(time_range: AbsoluteTimeRange) -> Self {
        Self {
            time_range,
            variable_state: VariableStateMap::new(),
            suggested_step_ms: None,
            mode: QueryMode::default(),
        }
    }

    pub fn with_variable_state(mut self, variable_state: VariableStateMap) -> Self {
        self.variable_state = variable_state;
        self
    }

    pub fn with_suggested_step_ms(mut self, step_ms: u64) -> Self {
        self.suggested_step_ms = Some(step_ms);
        self
    }

    pub fn with_mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Per-fetch context handed to [`get_time_series_data`].
///
/// Extends the run context with the query's position and a snapshot of
/// the upstream results resolved so far.
///
/// [`get_time_series_data`]: crate::plugin::TimeSeriesQueryPlugin::get_time_series_data
#[derive(Clone)]
pub struct FetchContext {
    pub query_index: usize,
    pub time_range: AbsoluteTimeRange,
    pub variable_state: VariableStateMap,
    pub suggested_step_ms: Option<u64>,
    pub mode: QueryMode,
    pub datasource_store: Arc<dyn DatasourceStore>,
    pub resolved_results: ResolvedResults,
}

impl FetchContext {
    pub(crate) fn new(
        context: &QueryContext,
        datasource_store: Arc<dyn DatasourceStore>,
        query_index: usize,
        resolved_results: ResolvedResults,
    ) -> Self {
        Self {
            query_index,
            time_range: context.time_range,
            variable_state: context.variable_state.clone(),
            suggested_step_ms: context.suggested_step_ms,
            mode: context.mode,
            datasource_store,
            resolved_results,
        }
    }

    /// Data of one upstream dependency, if it has resolved.
    pub fn dependency(&self, query_index: usize) -> Option<&Arc<TimeSeriesData>> {
        self.resolved_results.get(query_index)
    }
}
