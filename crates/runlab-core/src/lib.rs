//! runlab-core: client and run comparison engine for the Experimentation Lab.
//!
//! Runs are fetched once per experiment-type filter and then compared
//! entirely in memory: a capped [`Selection`], metric series, a parameter
//! diff and an exportable [`ComparisonArtifact`]. Network failures never
//! propagate out of the comparison path; they degrade to empty data.

pub mod client;
pub mod compare;
pub mod error;
pub mod filter;
pub mod launch;
pub mod models;
pub mod session;
pub mod settings;
pub mod store;

pub use client::{ClientConfig, LabApi, LabClient};
pub use compare::{ComparisonArtifact, ParamDiffRow, Selection, SeriesPoint, Toggle};
pub use error::{LabError, Result};
pub use filter::RunFilter;
pub use models::{Experiment, ExperimentRef, LabId, LogLine, Run, RunOutcome, RunStatus};
pub use session::CompareSession;
pub use settings::{Settings, SettingsPatch, SettingsStore};
pub use store::{LogBook, RunStore};
