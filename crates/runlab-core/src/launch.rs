//! Launching experiment runs from user-entered parameters.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::info;

use crate::client::LabApi;
use crate::error::{LabError, Result};
use crate::models::{LabId, RunOutcome};

pub const INVALID_PARAMS: &str = "Parameters must be valid JSON.";
pub const UNREADABLE_DATASET: &str = "Failed to read dataset file.";
pub const DATASET_NEEDS_OBJECT: &str = "Parameters must be a JSON object to attach a dataset.";

/// Parse the parameter text field. Blank input means `{}`.
pub fn parse_params(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(text).map_err(|_| LabError::InvalidParams(INVALID_PARAMS.to_string()))
}

/// Add the contents of the file at `path` to `params` as the string `csv`.
pub fn attach_dataset(params: Value, path: &Path) -> Result<Value> {
    let Value::Object(mut map) = params else {
        return Err(LabError::InvalidParams(DATASET_NEEDS_OBJECT.to_string()));
    };
    let text = fs::read_to_string(path).map_err(|_| LabError::InvalidParams(UNREADABLE_DATASET.to_string()))?;
    map.insert("csv".to_string(), Value::String(text));
    Ok(Value::Object(map))
}

/// Run experiment `experiment_id` with `params`.
pub async fn launch<A: LabApi + ?Sized>(api: &A, experiment_id: &LabId, params: &Value) -> Result<RunOutcome> {
    info!(experiment = %experiment_id, "Launching experiment run");
    api.run_experiment(experiment_id, params).await
}
