use thiserror::Error;

/// Errors surfaced by skiss outside of normal gameplay degradation.
///
/// In-game anomalies (out-of-margin pointers, not-ready classifier, stale
/// results) are filters, not errors, and never reach this type.
#[derive(Error, Debug)]
pub enum SkissError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("classifier worker: {0}")]
    Worker(String),

    #[error("asset error: {0}")]
    Asset(String),
}

pub type SkResult<T> = std::result::Result<T, SkissError>;
