use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompassError>;

/// Failure taxonomy for the normalization/ranking core.
///
/// Parsing never fails (it degrades to sentinel fields); everything here is a
/// resolution, indexing, or ranking-input problem that the caller must fix at
/// the source. None of these are retried internally.
#[derive(Debug, Error)]
pub enum CompassError {
    /// A score record references an entity absent from the resolver snapshot.
    /// The record is skipped and reported; sibling records in the batch
    /// continue.
    #[error("score record references unknown {kind} '{name}' (closest known: {closest})")]
    UnresolvedForeignKey {
        kind: &'static str,
        name: String,
        closest: String,
    },

    /// The embedding provider returned vectors of unexpected width. The whole
    /// index build is aborted; the previous index remains authoritative.
    #[error("embedding provider returned {actual}-dim vectors, expected {expected}")]
    EmbeddingDimensionMismatch { expected: usize, actual: usize },

    /// Search was attempted before any successful index build.
    #[error("semantic index has not been built yet; run an index rebuild first")]
    IndexUnavailable,

    /// Caller-supplied I/O ratio does not sum to 1.0 within tolerance.
    #[error("io ratio components must sum to 1.0, got {sum}")]
    InvalidIoRatio { sum: f64 },

    #[error("embedding request failed: {0}")]
    Embedding(#[from] reqwest::Error),

    #[error("index artifact is not valid JSON: {0}")]
    Artifact(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
