//! Error kinds shared across the pipeline and the request boundary.
//!
//! Each variant maps to a stable HTTP status in [`crate::server`]:
//!
//! | Variant | Status | Retryable |
//! |---------|--------|-----------|
//! | `InvalidRequest` | 400 | no — user-correctable |
//! | `ResourceNotFound` | 404 | no |
//! | `CorruptIndex` | 500 | no — re-ingest the resource |
//! | `Upstream` | 502 | yes, by the caller with backoff |
//! | `Timeout` | 504 | yes, by the caller |
//! | `IndexBuild` / `Io` | 500 | no |
//!
//! Per-file ingestion failures are not a variant here: the pipeline
//! isolates them and reports them in the [`crate::ingest::IngestReport`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// Missing or malformed question/resource name. Displays as the bare
    /// message, which the request boundary returns verbatim.
    #[error("{0}")]
    InvalidRequest(String),

    /// Index artifacts absent or incomplete for the named resource.
    #[error("no index found for resource '{0}'")]
    ResourceNotFound(String),

    /// Index artifacts exist but disagree with each other.
    #[error("index for resource '{name}' is corrupt: {reason}")]
    CorruptIndex { name: String, reason: String },

    /// Embedding or generation service returned an error.
    #[error("upstream service error: {0}")]
    Upstream(String),

    /// Embedding or generation call exceeded its configured timeout.
    #[error("upstream call timed out: {0}")]
    Timeout(String),

    /// Index construction rejected its input (empty or mixed-dims entries).
    #[error("index build failed: {0}")]
    IndexBuild(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
