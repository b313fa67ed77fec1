//! Cycle detection over the query dependency map.
//!
//! A query that participates in a dependency cycle can never become
//! ready, so cycles are diagnosed while planning and turned into
//! fail-fast errors instead of deadlocks.

use crate::dependency::DependencyMap;
use std::collections::HashSet;
use std::fmt;

/// Non-empty node path describing a detected cycle.
///
/// The path walks dependency edges from the starting query; the last
/// node is one already on the walk, closing the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CyclePath(Vec<usize>);

impl CyclePath {
    pub fn nodes(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for CyclePath {
    /// Queries are numbered from 1 in diagnostics: `Query #1 -> Query #2`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for idx in &self.0 {
            if !first {
                write!(f, " -> ")?;
            }
            write!(f, "Query #{}", idx + 1)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Default)]
struct DfsState {
    visited: HashSet<usize>,
    recursion_stack: HashSet<usize>,
}

/// Depth-first search for a cycle reachable from `query`.
///
/// Returns the first cycle found, or `None`. Self dependencies are not
/// cycles. Each call starts from fresh state; results are not memoized
/// across queries.
pub fn detect_cycle(query: usize, deps: &DependencyMap) -> Option<CyclePath> {
    let mut state = DfsState::default();
    walk(query, deps, &mut state)
}

fn walk(current: usize, deps: &DependencyMap, state: &mut DfsState) -> Option<CyclePath> {
    state.visited.insert(current);
    state.recursion_stack.insert(current);

    for dep in deps.external(current) {
        if !state.visited.contains(&dep) {
            if let Some(mut path) = walk(dep, deps, state) {
                path.0.insert(0, current);
                return Some(path);
            }
        } else if state.recursion_stack.contains(&dep) {
            return Some(CyclePath(vec![current, dep]));
        }
    }

    state.recursion_stack.remove(&current);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(lists: Vec<Vec<usize>>) -> DependencyMap {
        DependencyMap::from_lists(lists)
    }

    #[test]
    fn test_no_dependencies_no_cycle() {
        let deps = map(vec![vec![], vec![]]);
        assert_eq!(detect_cycle(0, &deps), None);
        assert_eq!(detect_cycle(1, &deps), None);
    }

    #[test]
    fn test_self_dependency_is_not_a_cycle() {
        let deps = map(vec![vec![0]]);
        assert_eq!(detect_cycle(0, &deps), None);
    }

    #[test]
    fn test_linear_chain_has_no_cycle() {
        // 2 -> 1 -> 0
        let deps = map(vec![vec![], vec![0], vec![1]]);
        assert_eq!(detect_cycle(2, &deps), None);
    }

    #[test]
    fn test_mutual_cycle() {
        let deps = map(vec![vec![1], vec![0]]);

        let path = detect_cycle(0, &deps).unwrap();
        assert_eq!(path.nodes(), &[0, 1, 0]);

        let path = detect_cycle(1, &deps).unwrap();
        assert_eq!(path.nodes(), &[1, 0, 1]);
    }

    #[test]
    fn test_three_query_cycle() {
        // 0 -> 1 -> 2 -> 0
        let deps = map(vec![vec![1], vec![2], vec![0]]);

        let path = detect_cycle(0, &deps).unwrap();
        assert_eq!(path.nodes(), &[0, 1, 2, 0]);
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        // 3 depends on 1 and 2, both of which depend on 0.
        let deps = map(vec![vec![], vec![0], vec![0], vec![1, 2]]);
        for query in 0..4 {
            assert_eq!(detect_cycle(query, &deps), None);
        }
    }

    #[test]
    fn test_cycle_in_one_diamond_branch() {
        // 3 -> 1 -> 0, 3 -> 2 <-> 4
        let deps = map(vec![vec![], vec![0], vec![4], vec![1, 2], vec![2]]);

        let path = detect_cycle(3, &deps).unwrap();
        assert_eq!(path.nodes(), &[3, 2, 4, 2]);
        assert_eq!(detect_cycle(1, &deps), None);
    }

    #[test]
    fn test_cycle_not_reachable_from_start() {
        // 1 <-> 2 cycle exists, but query 0 never reaches it.
        let deps = map(vec![vec![], vec![2], vec![1]]);
        assert_eq!(detect_cycle(0, &deps), None);
        assert!(detect_cycle(1, &deps).is_some());
    }

    #[test]
    fn test_display_numbers_queries_from_one() {
        assert_eq!(CyclePath(vec![0, 1]).to_string(), "Query #1 -> Query #2");
        assert_eq!(
            CyclePath(vec![0, 1, 0]).to_string(),
            "Query #1 -> Query #2 -> Query #1"
        );
        assert_eq!(CyclePath(vec![4]).to_string(), "Query #5");
    }
}
