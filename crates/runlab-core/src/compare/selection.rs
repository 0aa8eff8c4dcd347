//! Capped selection of runs to compare.

use crate::models::{LabId, Run};

/// Outcome of [`Selection::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
    /// The selection was full; nothing changed.
    Rejected,
}

/// An ordered set of run ids, never larger than its cap.
///
/// Ids are stored by their string form, so `1` and `"1"` are the same
/// entry. Insertion order is remembered, but [`selected_runs`](Self::selected_runs)
/// reports runs in the order of the run list so charts and tables do not
/// depend on click order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<String>,
    cap: usize,
}

impl Selection {
    pub fn new(cap: usize) -> Self {
        Self {
            ids: Vec::new(),
            cap,
        }
    }

    /// Remove `id` if present, otherwise add it unless the selection is full.
    pub fn toggle(&mut self, id: &LabId) -> Toggle {
        let key = id.key();
        if let Some(pos) = self.ids.iter().position(|k| *k == key) {
            self.ids.remove(pos);
            Toggle::Removed
        } else if self.ids.len() >= self.cap {
            Toggle::Rejected
        } else {
            self.ids.push(key);
            Toggle::Added
        }
    }

    pub fn contains(&self, id: &LabId) -> bool {
        let key = id.key();
        self.ids.iter().any(|k| *k == key)
    }

    /// Whether the row for `id` should be shown as not selectable.
    pub fn is_disabled(&self, id: &LabId) -> bool {
        !self.contains(id) && self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= self.cap
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in insertion order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Re-cap the selection. Shrinking drops the most recent insertions.
    pub fn set_cap(&mut self, cap: usize) {
        self.ids.truncate(cap);
        self.cap = cap;
    }

    /// The runs of `runs` that are selected, in `runs` order.
    pub fn selected_runs<'a>(&self, runs: &'a [Run]) -> Vec<&'a Run> {
        runs.iter().filter(|r| self.contains(&r.id)).collect()
    }
}
