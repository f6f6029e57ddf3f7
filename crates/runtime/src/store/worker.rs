//! Single-worker queue that owns one document's state.
//!
//! Every operation on a document is a [`Job`] processed in submission order,
//! so mutations of the same document never interleave while different
//! documents run on independent tasks.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::document::DocumentData;
use super::error::{PersistenceError, Result};

/// Operations queued on a document worker.
pub(crate) enum Job {
    /// Run a read or update closure against the in-memory state.
    Apply(Box<dyn FnOnce(&mut DocumentData) + Send>),

    /// Write the current state to disk.
    Save { reply: oneshot::Sender<Result<()>> },

    /// Clear the state and remove the backing file.
    Delete { reply: oneshot::Sender<Result<bool>> },
}

pub(crate) struct DocumentWorker {
    path: Arc<PathBuf>,
    data: DocumentData,
    jobs: mpsc::UnboundedReceiver<Job>,
}

impl DocumentWorker {
    pub(crate) fn new(path: Arc<PathBuf>, jobs: mpsc::UnboundedReceiver<Job>) -> Self {
        Self {
            path,
            data: DocumentData::default(),
            jobs,
        }
    }

    /// Main worker loop. Loads the file first so queued jobs observe it.
    pub(crate) async fn run(mut self) {
        self.data = load(&self.path).await;

        while let Some(job) = self.jobs.recv().await {
            match job {
                Job::Apply(op) => op(&mut self.data),
                Job::Save { reply } => {
                    let result = self.save().await;
                    let _ = reply.send(result);
                }
                Job::Delete { reply } => {
                    let result = self.delete().await;
                    let _ = reply.send(result);
                }
            }
        }

        debug!("Document worker for {} stopped", self.path.display());
    }

    async fn save(&mut self) -> Result<()> {
        let path = self.path.as_path();
        let bytes = serde_json::to_vec_pretty(self.data.root()).map_err(|source| {
            PersistenceError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| io_error(parent, source))?;
        }

        // Write to temp file, then atomic rename
        let temp_path = temp_path(path);
        tokio::fs::write(&temp_path, bytes)
            .await
            .map_err(|source| io_error(&temp_path, source))?;
        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|source| io_error(path, source))?;

        self.data.mark_clean();
        debug!("Saved document {}", path.display());

        Ok(())
    }

    async fn delete(&mut self) -> Result<bool> {
        self.data.reset();

        let path = self.path.as_path();
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!("Deleted document {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(io_error(path, source)),
        }
    }
}

/// Load the backing file, starting empty when it is missing or unreadable.
async fn load(path: &Path) -> DocumentData {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return DocumentData::default(),
        Err(e) => {
            warn!("Unable to read {}: {}; starting empty", path.display(), e);
            return DocumentData::default();
        }
    };

    match serde_json::from_slice::<Map<String, Value>>(&bytes) {
        Ok(root) => {
            debug!("Loaded document {} ({} keys)", path.display(), root.len());
            DocumentData::from_root(root)
        }
        Err(e) => {
            warn!("Malformed document {}: {}; starting empty", path.display(), e);
            DocumentData::default()
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}
