//! Error types for runlab-core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// User-entered parameters failed validation. The message is meant to be
    /// shown next to the input field as-is.
    #[error("{0}")]
    InvalidParams(String),

    #[error("Comparison needs at least 2 runs, {selected} selected")]
    NotEnoughRuns { selected: usize },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LabError>;
