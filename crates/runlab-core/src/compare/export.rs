//! Downloadable comparison artifact.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use tracing::info;

use super::params::ParamDiffRow;
use crate::error::{LabError, Result};
use crate::models::Run;

/// MIME type of the exported file.
pub const EXPORT_MIME: &str = "application/json";

/// Fewest runs a comparison can be built from.
pub const MIN_COMPARE_RUNS: usize = 2;

/// Snapshot of a comparison view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonArtifact {
    pub metric_key: String,
    pub selected_runs: Vec<Run>,
    pub param_diff: Vec<ParamDiffRow>,
    #[serde(serialize_with = "iso_millis")]
    pub generated_at: DateTime<Utc>,
}

impl ComparisonArtifact {
    /// Assemble an artifact. Fails with [`LabError::NotEnoughRuns`] for
    /// fewer than two runs.
    pub fn new(
        metric_key: impl Into<String>,
        runs: &[&Run],
        param_diff: Vec<ParamDiffRow>,
        generated_at: DateTime<Utc>,
    ) -> Result<Self> {
        if runs.len() < MIN_COMPARE_RUNS {
            return Err(LabError::NotEnoughRuns { selected: runs.len() });
        }
        Ok(Self {
            metric_key: metric_key.into(),
            selected_runs: runs.iter().map(|r| (*r).clone()).collect(),
            param_diff,
            generated_at,
        })
    }

    /// `lab-comparison-<epoch millis>.json`
    pub fn file_name(&self) -> String {
        format!("lab-comparison-{}.json", self.generated_at.timestamp_millis())
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the artifact into `dir` under [`file_name`](Self::file_name).
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.to_json()?)?;
        info!(path = %path.display(), runs = self.selected_runs.len(), "Comparison exported");
        Ok(path)
    }
}

fn iso_millis<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}
