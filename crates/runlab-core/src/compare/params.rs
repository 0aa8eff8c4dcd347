//! Key-by-key parameter comparison across selected runs.
//!
//! Equality is decided on a canonical JSON rendering of each value, not a
//! deep comparison. Objects keep the key order the API sent, so two
//! objects with the same entries in a different order count as different.
//! Numbers are rendered the way a JSON serializer in a browser would, so
//! `1` and `1.0` count as equal.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::models::Run;

/// One parameter key with each selected run's value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParamDiffRow {
    pub key: String,
    /// One entry per run, in the same order as the runs. `None` when the
    /// run has no such parameter; exported as `null`.
    ///
    /// Exported rows cannot tell a missing parameter from an explicit
    /// `null`: both read back as `None`. `is_different` is computed before
    /// export and keeps that distinction.
    pub values: Vec<Option<Value>>,
    pub is_different: bool,
}

/// Build the diff table for `runs`.
///
/// Rows cover the union of all parameter keys, sorted by byte order. A row
/// is different when its values do not all render identically; a missing
/// value differs from every present one, including `null`.
pub fn param_diff(runs: &[&Run]) -> Vec<ParamDiffRow> {
    let keys: BTreeSet<&str> = runs
        .iter()
        .flat_map(|r| r.params.keys().map(String::as_str))
        .collect();

    keys.into_iter()
        .map(|key| {
            let values: Vec<Option<Value>> = runs.iter().map(|r| r.params.get(key).cloned()).collect();
            let distinct: BTreeSet<String> = values.iter().map(|v| canonical_json(v.as_ref())).collect();
            ParamDiffRow {
                key: key.to_string(),
                values,
                is_different: distinct.len() > 1,
            }
        })
        .collect()
}

/// Compact JSON text used as the equality key. A missing value renders as
/// `undefined`, which no real JSON document produces.
pub fn canonical_json(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(v) => normalize(v).to_string(),
    }
}

fn normalize(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(normalize_number(n)),
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), normalize(v))).collect()),
        other => other.clone(),
    }
}

// Integral floats print without a fraction, as in `JSON.stringify`.
fn normalize_number(n: &Number) -> Number {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_SAFE => Number::from(f as i64),
        _ => n.clone(),
    }
}
