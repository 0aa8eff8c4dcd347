//! Search and facet filters over fetched runs and experiments.

use crate::models::{Experiment, Run, RunStatus};

/// Client-side filter used by run listings.
///
/// `search` is matched case-insensitively against the experiment name,
/// slug, run status and run id. `status` and `experiment_type` must match
/// exactly. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    pub search: Option<String>,
    pub status: Option<RunStatus>,
    pub experiment_type: Option<String>,
}

impl RunFilter {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, run: &Run) -> bool {
        self.matches_search(run) && self.matches_status(run) && self.matches_type(run)
    }

    pub fn apply<'a>(&self, runs: &'a [Run]) -> Vec<&'a Run> {
        runs.iter().filter(|r| self.matches(r)).collect()
    }

    fn matches_search(&self, run: &Run) -> bool {
        let q = match self.search.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => q.to_lowercase(),
            _ => return true,
        };
        let exp = &run.experiment;
        exp.display_name().to_lowercase().contains(&q)
            || exp.slug.as_deref().unwrap_or("").to_lowercase().contains(&q)
            || run.status.to_string().contains(&q)
            || run.id.key().contains(&q)
    }

    fn matches_status(&self, run: &Run) -> bool {
        self.status.map_or(true, |s| run.status == s)
    }

    fn matches_type(&self, run: &Run) -> bool {
        match self.experiment_type.as_deref() {
            None | Some("") => true,
            Some(t) => run.experiment.experiment_type.as_deref() == Some(t),
        }
    }
}

/// Distinct, non-empty experiment types in order of first appearance.
pub fn experiment_types(runs: &[Run]) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for t in runs.iter().filter_map(|r| r.experiment.experiment_type.as_deref()) {
        if !t.is_empty() && !types.iter().any(|seen| seen == t) {
            types.push(t.to_string());
        }
    }
    types
}

/// Experiments whose name or slug contains `search` (case-insensitive).
pub fn filter_experiments<'a>(experiments: &'a [Experiment], search: Option<&str>) -> Vec<&'a Experiment> {
    let q = match search.map(str::trim) {
        Some(q) if !q.is_empty() => q.to_lowercase(),
        _ => return experiments.iter().collect(),
    };
    experiments
        .iter()
        .filter(|e| e.name.to_lowercase().contains(&q) || e.slug.to_lowercase().contains(&q))
        .collect()
}
