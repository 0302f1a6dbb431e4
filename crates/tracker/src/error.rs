//! Error types for the tracker
//!
//! Flat hierarchy. Only construction and explicit API misuse produce errors;
//! anything that happens while reporting is swallowed by the sink.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Invalid options: {0}")]
    Config(String),

    #[error("History is not writable: {0}")]
    HistoryNotWritable(String),

    #[error("Navigation rejected: {0}")]
    Navigation(String),

    #[error("Report must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
