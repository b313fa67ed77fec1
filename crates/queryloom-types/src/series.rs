//! Time-series payloads returned by query plugins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Absolute time range in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsoluteTimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AbsoluteTimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Range ending now and spanning the given number of minutes.
    pub fn last_minutes(minutes: i64) -> Self {
        let end = Utc::now();
        Self {
            start: end - chrono::Duration::minutes(minutes),
            end,
        }
    }

    pub fn start_ms(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_ms(&self) -> i64 {
        self.end.timestamp_millis()
    }
}

/// One named series of `(timestamp_ms, value)` samples.
///
/// A `None` value marks a gap in the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    pub values: Vec<(i64, Option<f64>)>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, values: Vec<(i64, Option<f64>)>) -> Self {
        Self {
            name: name.into(),
            labels: None,
            values,
        }
    }

    pub fn with_labels(mut self, labels: BTreeMap<String, String>) -> Self {
        self.labels = Some(labels);
        self
    }
}

/// Result payload of a time-series query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesData {
    pub series: Vec<TimeSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<AbsoluteTimeRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_ms: Option<u64>,
}

impl TimeSeriesData {
    pub fn new(series: Vec<TimeSeries>) -> Self {
        Self {
            series,
            time_range: None,
            step_ms: None,
        }
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Timestamp of the first sample in the first series, 0 when absent.
    pub fn first_timestamp(&self) -> i64 {
        self.series
            .first()
            .and_then(|s| s.values.first())
            .map(|(ts, _)| *ts)
            .unwrap_or(0)
    }

    /// Timestamp of the last sample in the first series, 0 when absent.
    pub fn last_timestamp(&self) -> i64 {
        self.series
            .first()
            .and_then(|s| s.values.last())
            .map(|(ts, _)| *ts)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_from_first_series() {
        let data = TimeSeriesData::new(vec![
            TimeSeries::new("up", vec![(100, Some(1.0)), (200, Some(2.0)), (300, None)]),
            TimeSeries::new("down", vec![(900, Some(0.0))]),
        ]);

        assert_eq!(data.series_count(), 2);
        assert_eq!(data.first_timestamp(), 100);
        assert_eq!(data.last_timestamp(), 300);
    }

    #[test]
    fn test_timestamps_default_to_zero() {
        assert_eq!(TimeSeriesData::default().first_timestamp(), 0);
        assert_eq!(TimeSeriesData::default().last_timestamp(), 0);

        let empty_series = TimeSeriesData::new(vec![TimeSeries::new("empty", vec![])]);
        assert_eq!(empty_series.first_timestamp(), 0);
        assert_eq!(empty_series.last_timestamp(), 0);
    }
}
