use thiserror::Error;

/// Batch-fatal failure classes. Per-row degradations (stub profiles,
/// UNKNOWN verdicts) are encoded in the data instead — see registry.rs
/// and verdict.rs.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Every absent required column is listed, not just the first.
    #[error("missing required columns: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Every offending row is listed, not just the first.
    #[error("batch invariants violated: {}", .violations.join("; "))]
    Invariant { violations: Vec<String> },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A scoring backend cannot be reached or loaded. Fatal for the
    /// run — there is no silent fallback to a different backend.
    #[error("scoring backend '{backend}' unavailable: {reason}")]
    ModelUnavailable {
        backend: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
