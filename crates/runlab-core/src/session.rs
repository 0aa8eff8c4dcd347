//! A comparison session: the run store, selection, chosen metric and logs
//! owned by one view.
//!
//! All state changes go through `&mut self`, so there is a single owner
//! and no locking. Network results are applied in the order they arrive.

use chrono::{DateTime, Utc};

use crate::client::LabApi;
use crate::compare::{
    available_metric_keys, param_diff, series_for, BarChart, ComparisonArtifact, ParamDiffRow, Selection,
    SeriesPoint, Toggle, MIN_COMPARE_RUNS,
};
use crate::error::Result;
use crate::filter::RunFilter;
use crate::models::{LabId, LogLine, Run};
use crate::settings::{Settings, SettingsPatch};
use crate::store::{LogBook, RunStore};

pub struct CompareSession<A> {
    api: A,
    settings: Settings,
    store: RunStore,
    selection: Selection,
    logs: LogBook,
    logs_stale: bool,
}

impl<A: LabApi> CompareSession<A> {
    /// Start a session. The cap and initial metric come from `settings`.
    pub fn new(api: A, settings: Settings) -> Self {
        let settings = settings.normalized();
        Self {
            api,
            selection: Selection::new(settings.compare_cap),
            settings,
            store: RunStore::new(),
            logs: LogBook::new(),
            logs_stale: false,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Current settings, including any metric chosen during the session.
    /// Callers persist these.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Fetch runs for `experiment_type`. A failed fetch empties the list.
    pub async fn reload(&mut self, experiment_type: Option<&str>) -> &[Run] {
        self.store.load(&self.api, experiment_type).await;
        self.logs_stale = true;
        self.store.runs()
    }

    pub fn store(&self) -> &RunStore {
        &self.store
    }

    pub fn runs(&self) -> &[Run] {
        self.store.runs()
    }

    /// Runs shown in the pick list. Filtering never touches the selection.
    pub fn visible_runs(&self, filter: &RunFilter) -> Vec<&Run> {
        filter.apply(self.store.runs())
    }

    pub fn toggle(&mut self, id: &LabId) -> Toggle {
        let outcome = self.selection.toggle(id);
        if outcome != Toggle::Rejected {
            self.logs_stale = true;
        }
        outcome
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selected runs in run-list order.
    pub fn selected_runs(&self) -> Vec<&Run> {
        self.selection.selected_runs(self.store.runs())
    }

    /// Whether chart, diff and export are available.
    pub fn can_compare(&self) -> bool {
        self.selected_runs().len() >= MIN_COMPARE_RUNS
    }

    pub fn metric_key(&self) -> &str {
        &self.settings.compare_metric
    }

    /// Choose the plotted metric and record it in the session settings.
    pub fn set_metric(&mut self, metric_key: impl Into<String>) {
        self.settings = self.settings.merge(&SettingsPatch {
            compare_metric: Some(metric_key.into()),
            ..Default::default()
        });
    }

    /// Change the comparison cap and record it in the session settings.
    /// A smaller cap drops the most recently selected runs.
    pub fn set_cap(&mut self, cap: usize) {
        self.settings = self.settings.merge(&SettingsPatch {
            compare_cap: Some(cap),
            ..Default::default()
        });
        self.selection.set_cap(self.settings.compare_cap);
        self.logs_stale = true;
    }

    /// Plottable metric keys across all fetched runs.
    pub fn metric_keys(&self) -> Vec<String> {
        available_metric_keys(self.store.runs())
    }

    pub fn series(&self) -> Vec<SeriesPoint> {
        series_for(&self.selected_runs(), self.metric_key())
    }

    pub fn chart(&self) -> BarChart {
        BarChart::new(&self.series())
    }

    pub fn param_diff(&self) -> Vec<ParamDiffRow> {
        param_diff(&self.selected_runs())
    }

    /// Fetch logs of every selected run concurrently and merge them in.
    pub async fn refresh_logs(&mut self) {
        let selected = self.selection.selected_runs(self.store.runs());
        self.logs.refresh(&self.api, &selected, self.settings.logs_limit).await;
        self.logs_stale = false;
    }

    /// Refresh logs only if the selected runs may have changed since the
    /// last refresh.
    pub async fn sync_logs(&mut self) {
        if self.logs_stale {
            self.refresh_logs().await;
        }
    }

    pub fn logs(&self, id: &LabId) -> &[LogLine] {
        self.logs.get(id)
    }

    pub fn export(&self) -> Result<ComparisonArtifact> {
        self.export_at(Utc::now())
    }

    pub fn export_at(&self, at: DateTime<Utc>) -> Result<ComparisonArtifact> {
        let selected = self.selected_runs();
        ComparisonArtifact::new(self.metric_key(), &selected, param_diff(&selected), at)
    }
}
