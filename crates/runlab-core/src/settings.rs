//! Comparison settings: a versioned config object with documented defaults,
//! one merge function, and a YAML-backed store.
//!
//! The engine never reads settings from ambient state. Callers load a
//! [`Settings`] value, pass it in, and persist whatever comes back.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Current layout version of the settings file.
pub const SETTINGS_VERSION: u32 = 1;
/// Maximum number of runs selected for comparison.
pub const DEFAULT_COMPARE_CAP: usize = 5;
/// Metric plotted when nothing else was chosen.
pub const DEFAULT_COMPARE_METRIC: &str = "duration_ms";
/// Number of log lines fetched per run.
pub const DEFAULT_LOGS_LIMIT: usize = 200;

/// Lab comparison settings.
///
/// Missing keys take their defaults when deserializing, so a partial file
/// behaves like `{...defaults, ...file}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub version: u32,
    pub compare_cap: usize,
    pub compare_metric: String,
    pub logs_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            compare_cap: DEFAULT_COMPARE_CAP,
            compare_metric: DEFAULT_COMPARE_METRIC.to_string(),
            logs_limit: DEFAULT_LOGS_LIMIT,
        }
    }
}

/// A partial update. `None` leaves the current value alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_cap: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_limit: Option<usize>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.compare_cap.is_none() && self.compare_metric.is_none() && self.logs_limit.is_none()
    }
}

impl Settings {
    /// Apply `patch` on top of `self`. This is the only way settings change.
    pub fn merge(&self, patch: &SettingsPatch) -> Settings {
        Settings {
            version: SETTINGS_VERSION,
            compare_cap: patch.compare_cap.unwrap_or(self.compare_cap),
            compare_metric: patch
                .compare_metric
                .clone()
                .unwrap_or_else(|| self.compare_metric.clone()),
            logs_limit: patch.logs_limit.unwrap_or(self.logs_limit),
        }
        .normalized()
    }

    /// Replace unusable values with defaults. A zero cap or limit counts as
    /// unset, as does a blank metric name.
    pub fn normalized(mut self) -> Settings {
        self.version = SETTINGS_VERSION;
        if self.compare_cap == 0 {
            self.compare_cap = DEFAULT_COMPARE_CAP;
        }
        if self.logs_limit == 0 {
            self.logs_limit = DEFAULT_LOGS_LIMIT;
        }
        let metric = self.compare_metric.trim();
        self.compare_metric = if metric.is_empty() {
            DEFAULT_COMPARE_METRIC.to_string()
        } else {
            metric.to_string()
        };
        self
    }
}

/// Settings persisted as a YAML file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file. A missing file yields the defaults.
    pub fn try_load(&self) -> Result<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings.normalized())
    }

    /// Like [`try_load`](Self::try_load), but a broken file falls back to the
    /// defaults instead of failing.
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable settings, using defaults");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_yaml::to_string(settings)?;
        fs::write(&self.path, content)?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Load, merge `patch`, save, and return the merged settings.
    pub fn update(&self, patch: &SettingsPatch) -> Result<Settings> {
        let merged = self.load().merge(patch);
        self.save(&merged)?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.compare_cap, 5);
        assert_eq!(s.compare_metric, "duration_ms");
        assert_eq!(s.logs_limit, 200);
        assert_eq!(s.version, SETTINGS_VERSION);
    }

    #[test]
    fn test_merge_keeps_unpatched_values() {
        let base = Settings::default();
        let merged = base.merge(&SettingsPatch {
            compare_metric: Some("acc".to_string()),
            ..Default::default()
        });
        assert_eq!(merged.compare_metric, "acc");
        assert_eq!(merged.compare_cap, 5);
        assert_eq!(merged.logs_limit, 200);
    }

    #[test]
    fn test_merge_treats_zero_as_unset() {
        let merged = Settings::default().merge(&SettingsPatch {
            compare_cap: Some(0),
            logs_limit: Some(0),
            compare_metric: Some("  ".to_string()),
        });
        assert_eq!(merged, Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.yaml");
        fs::write(&path, "compareCap: 3\n").unwrap();

        let s = SettingsStore::new(&path).load();
        assert_eq!(s.compare_cap, 3);
        assert_eq!(s.compare_metric, "duration_ms");
        assert_eq!(s.logs_limit, 200);
    }

    #[test]
    fn test_garbled_file_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.yaml");
        fs::write(&path, "compareCap: [not, a, number\n").unwrap();

        let store = SettingsStore::new(&path);
        assert!(store.try_load().is_err());
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_update_persists() {
        let tmp = TempDir::new().unwrap();
        let store = SettingsStore::new(tmp.path().join("nested").join("settings.yaml"));

        let saved = store
            .update(&SettingsPatch {
                logs_limit: Some(50),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(saved.logs_limit, 50);
        assert_eq!(store.load().logs_limit, 50);

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("logsLimit"));
    }
}
