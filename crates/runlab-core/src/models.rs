//! Data models for the Experimentation Lab API.
//!
//! Everything here is a snapshot fetched from the remote API. The engine
//! reads these values but never mutates them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Identifier of a run or experiment.
///
/// The API sends either numbers or strings. Two ids are equal when their
/// string forms are equal, so `1` and `"1"` name the same run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabId {
    Int(i64),
    Text(String),
}

impl LabId {
    /// The string form used for all comparisons and map keys.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabId::Int(v) => write!(f, "{}", v),
            LabId::Text(v) => write!(f, "{}", v),
        }
    }
}

impl PartialEq for LabId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for LabId {}

impl std::hash::Hash for LabId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl From<i64> for LabId {
    fn from(v: i64) -> Self {
        LabId::Int(v)
    }
}
impl From<i32> for LabId {
    fn from(v: i32) -> Self {
        LabId::Int(v as i64)
    }
}
impl From<String> for LabId {
    fn from(v: String) -> Self {
        LabId::Text(v)
    }
}
impl From<&str> for LabId {
    fn from(v: &str) -> Self {
        LabId::Text(v.to_string())
    }
}

/// Status of a run as reported by the API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    /// Any status string this client does not know about.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(RunStatus::Pending),
            "running" => Ok(RunStatus::Running),
            "succeeded" => Ok(RunStatus::Succeeded),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status: {}", other)),
        }
    }
}

/// The experiment a run belongs to, as embedded in the run payload.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ExperimentRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub experiment_type: Option<String>,
}

impl ExperimentRef {
    /// Name for display: `name`, falling back to `slug`.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.slug.as_deref())
            .unwrap_or("")
    }
}

/// One execution instance of an experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    pub id: LabId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experiment: ExperimentRef,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: RunStatus,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Recorded metrics. Values are usually numbers but may be any JSON.
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub local_sqlite_path: Option<String>,
}

impl Run {
    /// A minimal run with the given id, mostly useful for building fixtures.
    pub fn new(id: impl Into<LabId>) -> Self {
        Self {
            id: id.into(),
            experiment: ExperimentRef::default(),
            status: RunStatus::default(),
            duration_ms: None,
            metrics: Map::new(),
            params: Map::new(),
            output: Value::Null,
            created_at: None,
            local_sqlite_path: None,
        }
    }

    /// `metrics[key]` when it is a finite number.
    pub fn numeric_metric(&self, key: &str) -> Option<f64> {
        self.metrics
            .get(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
    }

    /// `"#<id>"`, the label runs carry in charts and tables.
    pub fn label(&self) -> String {
        format!("#{}", self.id)
    }
}

/// A named, parameterized task template that runs instantiate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experiment {
    pub id: LabId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slug: String,
    #[serde(default)]
    pub experiment_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A single log line attached to a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogLine {
    #[serde(default, deserialize_with = "null_as_default")]
    pub level: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of launching an experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RunOutcome {
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: Map<String, Value>,
    #[serde(default)]
    pub output: Value,
    /// Whatever else the backend chose to include (run id, status, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// List responses come either as a bare array or wrapped in `{results: [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Bare(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> Listing<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) => items,
            Listing::Paged { results } => results,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
