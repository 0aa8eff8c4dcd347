//! Run store and per-run log fan-out.
//!
//! Both degrade instead of failing: a failed list fetch leaves an empty
//! store (with the error kept for display), and a failed log fetch leaves
//! an empty log list for that one run.

use std::collections::HashMap;

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::client::LabApi;
use crate::models::{Experiment, LabId, LogLine, Run};

/// Runs fetched for an optional experiment-type filter.
#[derive(Debug, Clone, Default)]
pub struct RunStore {
    runs: Vec<Run>,
    experiment_type: Option<String>,
    last_error: Option<String>,
}

impl RunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with `runs`, as if they had just been fetched.
    pub fn from_runs(runs: Vec<Run>) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    /// Fetch the runs for `experiment_type`, replacing the current list.
    ///
    /// The filter is passed straight to the API; no client-side type
    /// filtering happens here. On any failure the list becomes empty and
    /// the error message is kept in [`last_error`](Self::last_error).
    pub async fn load<A: LabApi + ?Sized>(&mut self, api: &A, experiment_type: Option<&str>) -> &[Run] {
        self.experiment_type = experiment_type.map(str::to_string);
        match api.list_runs(experiment_type).await {
            Ok(runs) => {
                debug!(count = runs.len(), ?experiment_type, "Loaded runs");
                self.runs = runs;
                self.last_error = None;
            }
            Err(e) => {
                warn!(error = %e, ?experiment_type, "Failed to load runs");
                self.runs.clear();
                self.last_error = Some(e.to_string());
            }
        }
        &self.runs
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn experiment_type(&self) -> Option<&str> {
        self.experiment_type.as_deref()
    }

    /// Message of the most recent failed load, cleared by a successful one.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn find(&self, id: &LabId) -> Option<&Run> {
        self.runs.iter().find(|r| &r.id == id)
    }
}

/// Experiments for an optional type filter; a failed fetch yields an empty list.
pub async fn load_experiments<A: LabApi + ?Sized>(api: &A, experiment_type: Option<&str>) -> Vec<Experiment> {
    match api.list_experiments(experiment_type).await {
        Ok(experiments) => experiments,
        Err(e) => {
            warn!(error = %e, ?experiment_type, "Failed to load experiments");
            Vec::new()
        }
    }
}

/// Fetch the latest logs of every run concurrently.
///
/// All requests are issued at once and joined; the result has one entry per
/// run in `runs` order. A run whose request fails gets an empty list.
pub async fn fetch_logs<A: LabApi + ?Sized>(api: &A, runs: &[&Run], limit: usize) -> Vec<(LabId, Vec<LogLine>)> {
    let fetches = runs.iter().map(|run| async move {
        let lines = match api.run_logs(&run.id, limit).await {
            Ok(lines) => lines,
            Err(e) => {
                warn!(run = %run.id, error = %e, "Failed to fetch run logs");
                Vec::new()
            }
        };
        (run.id.clone(), lines)
    });
    join_all(fetches).await
}

/// Log lines keyed by run id.
#[derive(Debug, Clone, Default)]
pub struct LogBook {
    entries: HashMap<String, Vec<LogLine>>,
}

impl LogBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry of each run in `batch`. Entries of other runs are
    /// left as they are.
    pub fn merge(&mut self, batch: Vec<(LabId, Vec<LogLine>)>) {
        for (id, lines) in batch {
            self.entries.insert(id.key(), lines);
        }
    }

    /// Fetch logs for `runs` and merge them in. No-op for an empty slice.
    pub async fn refresh<A: LabApi + ?Sized>(&mut self, api: &A, runs: &[&Run], limit: usize) {
        if runs.is_empty() {
            return;
        }
        let batch = fetch_logs(api, runs, limit).await;
        self.merge(batch);
    }

    /// Lines for `id`; empty when nothing was fetched for it.
    pub fn get(&self, id: &LabId) -> &[LogLine] {
        self.entries.get(&id.key()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: &LabId) -> bool {
        self.entries.contains_key(&id.key())
    }
}
