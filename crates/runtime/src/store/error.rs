//! Error types raised by the document store.

use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced through document futures.
///
/// In-memory state is never rolled back when one of these occurs; the caller
/// decides whether to retry the save or report it.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("document worker for {} is no longer running", path.display())]
    Closed { path: PathBuf },

    #[error("persistence task failed")]
    Task(#[source] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
