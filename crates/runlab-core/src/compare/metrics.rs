//! Metric discovery, chart series and the bar chart model.

use serde::{Deserialize, Serialize};

use crate::models::Run;

/// The always-available metric, read from `Run::duration_ms`.
pub const DURATION_METRIC: &str = "duration_ms";

/// Metric keys that can be plotted for `runs`.
///
/// `duration_ms` comes first, followed by every key that holds a finite
/// number on at least one run, in order of discovery.
pub fn available_metric_keys(runs: &[Run]) -> Vec<String> {
    let mut keys = vec![DURATION_METRIC.to_string()];
    for run in runs {
        for (key, value) in &run.metrics {
            let numeric = value.as_f64().is_some_and(f64::is_finite);
            if numeric && !keys.iter().any(|k| k == key) {
                keys.push(key.clone());
            }
        }
    }
    keys
}

/// The plotted value of `metric_key` for `run`. Missing or non-numeric
/// values plot as 0.
pub fn metric_value(run: &Run, metric_key: &str) -> f64 {
    if metric_key == DURATION_METRIC {
        run.duration_ms.unwrap_or(0) as f64
    } else {
        run.numeric_metric(metric_key).unwrap_or(0.0)
    }
}

/// One labelled value of a chart series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// Chart series for `metric_key`, one point per run in `runs` order.
pub fn series_for(runs: &[&Run], metric_key: &str) -> Vec<SeriesPoint> {
    runs.iter()
        .map(|run| SeriesPoint {
            label: run.label(),
            value: metric_value(run, metric_key),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    /// Width as a percentage of the largest value, in `[0, 100]`.
    pub percent: f64,
}

/// Horizontal bar chart scaled to the largest non-negative value.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub max: f64,
    pub bars: Vec<Bar>,
}

impl BarChart {
    pub fn new(series: &[SeriesPoint]) -> Self {
        let max = series.iter().map(|p| p.value).fold(0.0, f64::max);
        let bars = series
            .iter()
            .map(|p| Bar {
                label: p.label.clone(),
                value: p.value,
                percent: if max > 0.0 {
                    (p.value / max * 100.0).clamp(0.0, 100.0)
                } else {
                    0.0
                },
            })
            .collect();
        Self { max, bars }
    }
}
