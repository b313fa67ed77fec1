// Derived Queries Example
// Demonstrates dependency-resolved query execution: source queries,
// formulas reading their results, cache-served reruns, and cycle errors.
//
// Run: cargo run --example derived_queries

use async_trait::async_trait;
use queryloom::prelude::*;
use serde_json::json;

/// Pretends to be a metrics backend: returns a synthetic series per
/// instance named in the spec.
struct MetricsSourcePlugin;

#[async_trait]
impl TimeSeriesQueryPlugin for MetricsSourcePlugin {
    async fn get_time_series_data(
        &self,
        spec: &serde_json::Value,
        ctx: &FetchContext,
    ) -> Result<TimeSeriesData, QueryError> {
        let metric = spec.get("metric").and_then(|v| v.as_str()).unwrap_or("up");
        let start = ctx.time_range.start_ms();
        let series = (0..2u32)
            .map(|instance| {
                let values = (0..5i64)
                    .map(|i| (start + i * 60_000, Some((instance + 1) as f64 * (i + 1) as f64)))
                    .collect();
                TimeSeries::new(format!("{metric}{{instance=\"{instance}\"}}"), values)
            })
            .collect();
        Ok(TimeSeriesData::new(series))
    }
}

/// Sums, point by point, the series of the queries named in `"inputs"`.
struct SumFormulaPlugin;

impl SumFormulaPlugin {
    fn inputs(spec: &serde_json::Value) -> Vec<usize> {
        spec.get("inputs")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_u64().map(|n| n as usize))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl TimeSeriesQueryPlugin for SumFormulaPlugin {
    async fn get_time_series_data(
        &self,
        spec: &serde_json::Value,
        ctx: &FetchContext,
    ) -> Result<TimeSeriesData, QueryError> {
        let mut totals: std::collections::BTreeMap<i64, f64> = std::collections::BTreeMap::new();
        for input in Self::inputs(spec) {
            let data = ctx.dependency(input).ok_or_else(|| {
                QueryError::Execution(format!("input query #{input} has no data"))
            })?;
            for series in &data.series {
                for (ts, value) in &series.values {
                    if let Some(value) = value {
                        *totals.entry(*ts).or_insert(0.0) += value;
                    }
                }
            }
        }
        let values = totals.into_iter().map(|(ts, v)| (ts, Some(v))).collect();
        Ok(TimeSeriesData::new(vec![TimeSeries::new("sum", values)]))
    }

    fn depends_on(&self, spec: &serde_json::Value, _ctx: &QueryContext) -> PluginDependencies {
        PluginDependencies::on_queries(Self::inputs(spec))
    }
}

fn print_outcome(outcome: &RunOutcome) {
    for (idx, result) in outcome.results.iter().enumerate() {
        let origin = if result.from_cache { "cache" } else { "fetch" };
        match (&result.data, &result.error) {
            (Some(data), _) => println!(
                "  ✅ query #{idx}: {:?} ({} series, via {origin})",
                result.status,
                data.series_count()
            ),
            (None, Some(error)) => println!("  ❌ query #{idx}: {:?} ({error})", result.status),
            (None, None) => println!("  ⏳ query #{idx}: {:?}", result.status),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    println!();
    println!("═══════════════════════════════════════════════════");
    println!("      queryloom: derived queries walkthrough");
    println!("═══════════════════════════════════════════════════");

    let loader = StaticPluginLoader::new();
    loader.register("metrics", MetricsSourcePlugin);
    loader.register("sum", SumFormulaPlugin);
    let loom = QueryLoom::builder().with_loader(loader).build()?;

    let mut variables = VariableStateMap::new();
    variables.insert("job", VariableState::loaded("api"));
    let context = QueryContext::new(AbsoluteTimeRange::last_minutes(15))
        .with_variable_state(variables);

    // Part 1: two sources and a formula summing them. The formula only
    // runs after both sources resolve.
    println!();
    println!("Part 1: resolve a formula over two source queries");
    let definitions = vec![
        TimeSeriesQueryDefinition::new("metrics", json!({ "metric": "cpu_usage" })),
        TimeSeriesQueryDefinition::new("metrics", json!({ "metric": "mem_usage" })),
        TimeSeriesQueryDefinition::new("sum", json!({ "inputs": [0, 1] })),
    ];
    let outcome = loom.run(&definitions, &context).await;
    print_outcome(&outcome);

    // Part 2: nothing changed, so every query is served from the cache.
    println!();
    println!("Part 2: rerun unchanged (cache-served)");
    let outcome = loom.run(&definitions, &context).await;
    print_outcome(&outcome);

    // Part 3: two formulas reading each other can never resolve; the
    // run fails them fast instead of hanging.
    println!();
    println!("Part 3: a dependency cycle fails fast");
    let cyclic = vec![
        TimeSeriesQueryDefinition::new("sum", json!({ "inputs": [1] })),
        TimeSeriesQueryDefinition::new("sum", json!({ "inputs": [0] })),
    ];
    let outcome = loom.run(&cyclic, &context).await;
    print_outcome(&outcome);

    println!();
    println!("Engine metrics:");
    println!("{}", serde_json::to_string_pretty(&loom.metrics().snapshot())?);

    Ok(())
}
