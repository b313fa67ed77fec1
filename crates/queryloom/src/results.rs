//! Resolved result snapshots and fingerprints.
//!
//! Fingerprints are intentionally coarse: they capture the shape of the
//! data (series counts, first/last timestamps) rather than its full
//! contents, so dependents refetch when upstream data meaningfully
//! changes without hashing every sample.

use crate::dependency::DependencyMap;
use queryloom_types::TimeSeriesData;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

/// Snapshot of successfully fetched results, keyed by query index.
///
/// Only queries with data appear; a missing entry means the query has
/// not resolved yet. Snapshots are replaced wholesale, never mutated in
/// place, while a run is in flight.
#[derive(Debug, Clone, Default)]
pub struct ResolvedResults {
    results: BTreeMap<usize, Arc<TimeSeriesData>>,
}

impl ResolvedResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the slots that currently hold data, index-aligned.
    pub fn from_slots<'a, I>(slots: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a Arc<TimeSeriesData>>>,
    {
        let mut results = BTreeMap::new();
        for (idx, data) in slots.into_iter().enumerate() {
            if let Some(data) = data {
                results.insert(idx, data.clone());
            }
        }
        Self { results }
    }

    pub fn insert(&mut self, query: usize, data: Arc<TimeSeriesData>) {
        self.results.insert(query, data);
    }

    pub fn get(&self, query: usize) -> Option<&Arc<TimeSeriesData>> {
        self.results.get(&query)
    }

    pub fn contains(&self, query: usize) -> bool {
        self.results.contains_key(&query)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.results.keys().copied()
    }

    /// Compact fingerprint of which queries have resolved and how many
    /// series each returned: `"0:2,1:1"`. The empty snapshot fingerprints
    /// as `""`.
    ///
    /// Two snapshots with equal fingerprints are treated as equivalent;
    /// the snapshot is only republished when the fingerprint changes.
    pub fn fingerprint(&self) -> String {
        let mut out = String::new();
        for (idx, data) in &self.results {
            if !out.is_empty() {
                out.push(',');
            }
            let _ = write!(out, "{}:{}", idx, data.series_count());
        }
        out
    }
}

/// Fingerprint of the external dependencies of one query, used as cache
/// key material.
///
/// Each resolved dependency contributes `"idx:seriesCount:firstTs:lastTs"`,
/// an unresolved one contributes `"idx:null"`, joined by `|`. Queries
/// without external dependencies fingerprint as `""`.
pub fn dependency_fingerprint(
    resolved: &ResolvedResults,
    deps: &DependencyMap,
    query: usize,
) -> String {
    let mut out = String::new();
    for dep in deps.external(query) {
        if !out.is_empty() {
            out.push('|');
        }
        match resolved.get(dep) {
            Some(data) => {
                let _ = write!(
                    out,
                    "{}:{}:{}:{}",
                    dep,
                    data.series_count(),
                    data.first_timestamp(),
                    data.last_timestamp()
                );
            }
            None => {
                let _ = write!(out, "{}:null", dep);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use queryloom_types::TimeSeries;

    fn data(series: usize, first_ts: i64, last_ts: i64) -> Arc<TimeSeriesData> {
        let series = (0..series)
            .map(|i| {
                TimeSeries::new(
                    format!("series-{i}"),
                    vec![(first_ts, Some(1.0)), (last_ts, Some(2.0))],
                )
            })
            .collect();
        Arc::new(TimeSeriesData::new(series))
    }

    #[test]
    fn test_from_slots_skips_empty_slots() {
        let a = data(1, 0, 10);
        let c = data(2, 0, 10);
        let slots = [Some(&a), None, Some(&c)];

        let results = ResolvedResults::from_slots(slots);

        assert_eq!(results.len(), 2);
        assert!(results.contains(0));
        assert!(!results.contains(1));
        assert!(results.contains(2));
    }

    #[test]
    fn test_results_fingerprint_format() {
        let mut results = ResolvedResults::new();
        assert_eq!(results.fingerprint(), "");

        results.insert(2, data(3, 0, 10));
        results.insert(0, data(1, 0, 10));

        // Ascending index order regardless of insertion order.
        assert_eq!(results.fingerprint(), "0:1,2:3");
    }

    #[test]
    fn test_results_fingerprint_ignores_sample_values() {
        let mut a = ResolvedResults::new();
        a.insert(0, data(2, 0, 10));
        let mut b = ResolvedResults::new();
        b.insert(0, data(2, 500, 900));

        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_dependency_fingerprint_empty_without_external_deps() {
        let deps = DependencyMap::from_lists(vec![vec![], vec![1]]);
        let resolved = ResolvedResults::new();

        assert_eq!(dependency_fingerprint(&resolved, &deps, 0), "");
        // A self dependency does not contribute either.
        assert_eq!(dependency_fingerprint(&resolved, &deps, 1), "");
    }

    #[test]
    fn test_dependency_fingerprint_marks_unresolved_deps() {
        let deps = DependencyMap::from_lists(vec![vec![], vec![], vec![0, 1]]);
        let mut resolved = ResolvedResults::new();
        resolved.insert(0, data(2, 100, 200));

        assert_eq!(
            dependency_fingerprint(&resolved, &deps, 2),
            "0:2:100:200|1:null"
        );
    }

    #[test]
    fn test_dependency_fingerprint_tracks_time_bounds() {
        let deps = DependencyMap::from_lists(vec![vec![], vec![0]]);

        let mut before = ResolvedResults::new();
        before.insert(0, data(1, 100, 200));
        let mut after = ResolvedResults::new();
        after.insert(0, data(1, 100, 300));

        assert_ne!(
            dependency_fingerprint(&before, &deps, 1),
            dependency_fingerprint(&after, &deps, 1)
        );
    }
}
