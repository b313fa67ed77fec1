use proptest::prelude::*;
use queryloom::cycle::detect_cycle;
use queryloom::dependency::DependencyMap;
use queryloom::results::ResolvedResults;
use queryloom_types::{TimeSeries, TimeSeriesData};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Dependency lists where every edge points to a strictly lower index,
/// which makes the graph acyclic by construction.
fn forward_dep_lists(max_len: usize) -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(
        prop::collection::vec(any::<prop::sample::Index>(), 0..4),
        1..max_len,
    )
    .prop_map(|raw| {
        raw.iter()
            .enumerate()
            .map(|(i, deps)| {
                if i == 0 {
                    Vec::new()
                } else {
                    deps.iter().map(|d| d.index(i)).collect()
                }
            })
            .collect()
    })
}

fn resolved_from(indices: &BTreeSet<usize>) -> ResolvedResults {
    let mut results = ResolvedResults::new();
    for &idx in indices {
        results.insert(idx, Arc::new(TimeSeriesData::default()));
    }
    results
}

fn data_with_series(count: usize) -> Arc<TimeSeriesData> {
    let series = (0..count)
        .map(|i| TimeSeries::new(format!("s{i}"), vec![(100, Some(1.0))]))
        .collect();
    Arc::new(TimeSeriesData::new(series))
}

// Property: A graph whose edges all point to lower indices has no cycle
proptest! {
    #[test]
    fn prop_forward_edges_never_cycle(lists in forward_dep_lists(12)) {
        let deps = DependencyMap::from_lists(lists);
        for query in 0..deps.len() {
            prop_assert_eq!(detect_cycle(query, &deps), None);
        }
    }
}

// Property: A planted ring is always detected, and the reported path
// walks real dependency edges back to a node already on the path
proptest! {
    #[test]
    fn prop_ring_is_detected(
        n in 2usize..10,
        extra in prop::collection::vec(
            (any::<prop::sample::Index>(), any::<prop::sample::Index>()),
            0..6,
        ),
    ) {
        let mut lists: Vec<Vec<usize>> = (0..n).map(|i| vec![(i + 1) % n]).collect();
        for (from, to) in &extra {
            lists[from.index(n)].push(to.index(n));
        }
        let deps = DependencyMap::from_lists(lists.clone());

        let path = detect_cycle(0, &deps);
        prop_assert!(path.is_some());
        let path = path.unwrap();
        let nodes = path.nodes();

        for pair in nodes.windows(2) {
            prop_assert!(lists[pair[0]].contains(&pair[1]));
        }
        let last = *nodes.last().unwrap();
        prop_assert!(nodes[..nodes.len() - 1].contains(&last));
    }
}

// Property: A query that is ready stays ready as more results resolve
proptest! {
    #[test]
    fn prop_readiness_is_monotone(
        lists in forward_dep_lists(10),
        base in prop::collection::btree_set(0usize..10, 0..10),
        extra in prop::collection::btree_set(0usize..10, 0..10),
    ) {
        let deps = DependencyMap::from_lists(lists);
        let small = resolved_from(&base);
        let union: BTreeSet<usize> = base.union(&extra).copied().collect();
        let large = resolved_from(&union);

        for query in 0..deps.len() {
            if deps.is_ready(query, &small) {
                prop_assert!(deps.is_ready(query, &large));
            }
        }
    }
}

// Property: Once every external dependency of a query is resolved, the
// query is ready no matter what else the snapshot holds
proptest! {
    #[test]
    fn prop_full_resolution_means_ready(lists in forward_dep_lists(10)) {
        let deps = DependencyMap::from_lists(lists);
        let all: BTreeSet<usize> = (0..deps.len()).collect();
        let resolved = resolved_from(&all);

        for query in 0..deps.len() {
            prop_assert!(deps.is_ready(query, &resolved));
        }
    }
}

// Property: Two snapshots fingerprint equally exactly when they hold
// the same series counts at the same query indices
proptest! {
    #[test]
    fn prop_fingerprint_tracks_contents(
        a in prop::collection::btree_map(0usize..8, 0usize..4, 0..8),
        b in prop::collection::btree_map(0usize..8, 0usize..4, 0..8),
    ) {
        let build = |counts: &BTreeMap<usize, usize>| {
            let mut results = ResolvedResults::new();
            for (&idx, &count) in counts {
                results.insert(idx, data_with_series(count));
            }
            results
        };

        let left = build(&a);
        let right = build(&b);
        prop_assert_eq!(left.fingerprint() == right.fingerprint(), a == b);
    }
}
