//! Run comparison engine: selection, metric aggregation, parameter diff
//! and export. Everything here is synchronous and works on fetched runs.

pub mod export;
pub mod metrics;
pub mod params;
pub mod selection;

pub use export::{ComparisonArtifact, EXPORT_MIME, MIN_COMPARE_RUNS};
pub use metrics::{available_metric_keys, metric_value, series_for, Bar, BarChart, SeriesPoint, DURATION_METRIC};
pub use params::{canonical_json, param_diff, ParamDiffRow};
pub use selection::{Selection, Toggle};
