//! Per-query dependency map built from plugin `depends_on` hooks.

use crate::context::QueryContext;
use crate::plugin::TimeSeriesQueryPlugin;
use crate::results::ResolvedResults;
use queryloom_types::TimeSeriesQueryDefinition;
use std::sync::Arc;

/// Dependency lists for every query in a run, index-aligned with the
/// submitted definitions.
///
/// Query dependencies are kept raw, self references included; readiness
/// and cycle checks filter those out where the distinction matters.
#[derive(Debug, Clone, Default)]
pub struct DependencyMap {
    queries: Vec<Vec<usize>>,
    variables: Vec<Option<Vec<String>>>,
}

impl DependencyMap {
    /// Ask each loaded plugin which queries and variables its spec reads.
    ///
    /// Definitions whose plugin is missing or still loading get an empty
    /// entry.
    pub fn from_definitions(
        definitions: &[TimeSeriesQueryDefinition],
        plugins: &[Option<Arc<dyn TimeSeriesQueryPlugin>>],
        context: &QueryContext,
    ) -> Self {
        let mut queries = Vec::with_capacity(definitions.len());
        let mut variables = Vec::with_capacity(definitions.len());

        for (idx, definition) in definitions.iter().enumerate() {
            match plugins.get(idx).and_then(|p| p.as_ref()) {
                Some(plugin) => {
                    let deps = plugin.depends_on(&definition.spec, context);
                    queries.push(deps.queries);
                    variables.push(deps.variables);
                }
                None => {
                    queries.push(Vec::new());
                    variables.push(None);
                }
            }
        }

        Self { queries, variables }
    }

    /// Build a map from raw query dependency lists. Variable dependencies
    /// are left undeclared.
    pub fn from_lists(queries: Vec<Vec<usize>>) -> Self {
        let variables = vec![None; queries.len()];
        Self { queries, variables }
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Raw dependency list for a query. Unknown indices read as empty.
    pub fn get(&self, query: usize) -> &[usize] {
        self.queries.get(query).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Variable names a query declared, if any.
    pub fn variables(&self, query: usize) -> Option<&[String]> {
        self.variables
            .get(query)
            .and_then(|v| v.as_deref())
    }

    /// External dependencies of a query: self references are trivially
    /// satisfied and excluded.
    pub fn external(&self, query: usize) -> impl Iterator<Item = usize> + '_ {
        self.get(query).iter().copied().filter(move |&dep| dep != query)
    }

    /// Whether the query declared any dependency at all, self included.
    pub fn has_dependencies(&self, query: usize) -> bool {
        !self.get(query).is_empty()
    }

    /// A query is ready once every external dependency has a resolved
    /// result. Queries without external dependencies are always ready.
    pub fn is_ready(&self, query: usize, resolved: &ResolvedResults) -> bool {
        self.external(query).all(|dep| resolved.contains(dep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FetchContext;
    use crate::plugin::PluginDependencies;
    use async_trait::async_trait;
    use queryloom_types::{AbsoluteTimeRange, QueryError, TimeSeriesData};

    struct DependentPlugin {
        deps: Vec<usize>,
    }

    #[async_trait]
    impl TimeSeriesQueryPlugin for DependentPlugin {
        async fn get_time_series_data(
            &self,
            _spec: &serde_json::Value,
            _ctx: &FetchContext,
        ) -> Result<TimeSeriesData, QueryError> {
            Ok(TimeSeriesData::default())
        }

        fn depends_on(
            &self,
            _spec: &serde_json::Value,
            _ctx: &QueryContext,
        ) -> PluginDependencies {
            PluginDependencies::on_queries(self.deps.clone())
        }
    }

    fn resolved(indices: &[usize]) -> ResolvedResults {
        let mut results = ResolvedResults::new();
        for &idx in indices {
            results.insert(idx, Arc::new(TimeSeriesData::default()));
        }
        results
    }

    #[test]
    fn test_no_dependencies_is_ready() {
        let map = DependencyMap::from_lists(vec![vec![]]);
        assert!(map.is_ready(0, &ResolvedResults::new()));
    }

    #[test]
    fn test_self_dependency_is_trivially_satisfied() {
        let map = DependencyMap::from_lists(vec![vec![0]]);
        assert!(map.is_ready(0, &ResolvedResults::new()));
        assert!(map.has_dependencies(0));
        assert_eq!(map.external(0).count(), 0);
    }

    #[test]
    fn test_external_dependency_blocks_until_resolved() {
        let map = DependencyMap::from_lists(vec![vec![], vec![0]]);

        assert!(!map.is_ready(1, &ResolvedResults::new()));
        assert!(map.is_ready(1, &resolved(&[0])));
    }

    #[test]
    fn test_all_external_dependencies_required() {
        let map = DependencyMap::from_lists(vec![vec![], vec![], vec![0, 1]]);

        assert!(!map.is_ready(2, &resolved(&[0])));
        assert!(map.is_ready(2, &resolved(&[0, 1])));
    }

    #[test]
    fn test_out_of_range_index_reads_as_empty() {
        let map = DependencyMap::from_lists(vec![vec![]]);
        assert_eq!(map.get(17), &[] as &[usize]);
        assert!(map.is_ready(17, &ResolvedResults::new()));
    }

    #[test]
    fn test_out_of_range_dependency_never_resolves() {
        // Query 0 names a dependency index that no definition occupies.
        let map = DependencyMap::from_lists(vec![vec![5]]);
        assert!(!map.is_ready(0, &resolved(&[0, 1, 2])));
    }

    #[tokio::test]
    async fn test_from_definitions_queries_each_plugin() {
        let definitions = vec![
            TimeSeriesQueryDefinition::new("a", serde_json::json!({})),
            TimeSeriesQueryDefinition::new("b", serde_json::json!({})),
            TimeSeriesQueryDefinition::new("c", serde_json::json!({})),
        ];
        let plugins: Vec<Option<Arc<dyn TimeSeriesQueryPlugin>>> = vec![
            Some(Arc::new(DependentPlugin { deps: vec![] })),
            Some(Arc::new(DependentPlugin { deps: vec![0] })),
            None, // still loading
        ];
        let context = QueryContext::new(AbsoluteTimeRange::last_minutes(5));

        let map = DependencyMap::from_definitions(&definitions, &plugins, &context);

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(0), &[] as &[usize]);
        assert_eq!(map.get(1), &[0]);
        assert_eq!(map.get(2), &[] as &[usize]);
    }
}
