//! # queryloom
//!
//! Dependency-resolving execution engine for time-series queries.
//!
//! Dashboards routinely define queries that read the results of other
//! queries (formulas over raw series, math between panels). queryloom
//! accepts a list of query definitions, asks each query's plugin which
//! other queries and variables it depends on, resolves the resulting
//! graph in order, detects and fails dependency cycles, runs independent
//! fetches concurrently, and caches results under content-addressed keys
//! so unchanged queries never refetch.

pub mod builder;
pub mod cache; // LRU result cache
pub mod context;
pub mod cycle;
pub mod dependency;
mod error;
pub mod loom;
mod metrics;
mod plan;
pub mod plugin;
pub mod registry;
pub mod results;
mod runner;

pub use error::EngineError;
pub use loom::{QueryLoom, QueryResult, QueryStatus, RunOutcome};
pub use metrics::{EngineMetrics, MetricsSnapshot};

pub mod prelude {
    pub use crate::builder::LoomBuilder;
    pub use crate::context::{FetchContext, QueryContext};
    pub use crate::cycle::{CyclePath, detect_cycle};
    pub use crate::dependency::DependencyMap;
    pub use crate::loom::{QueryLoom, QueryResult, QueryStatus, RunOutcome};
    pub use crate::plugin::{PluginDependencies, TimeSeriesQueryPlugin};
    pub use crate::registry::{PluginLoader, PluginRegistry, StaticPluginLoader};
    pub use crate::results::ResolvedResults;
    pub use queryloom_types::{
        AbsoluteTimeRange, DatasourceSelector, DatasourceStore, QueryError, QueryMode,
        StaticDatasourceStore, TimeSeries, TimeSeriesData, TimeSeriesQueryDefinition,
        VariableState, VariableStateMap, VariableValue,
    };
}
