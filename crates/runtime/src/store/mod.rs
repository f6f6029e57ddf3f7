//! File-backed document store.
//!
//! Each resource path maps to one [`Document`] with its own worker task.
//! Operations on the same document run in submission order; different
//! documents proceed in parallel.

mod document;
mod error;
mod worker;

pub use document::{Document, DocumentData, PATH_SEPARATOR};
pub use error::{PersistenceError, Result};

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tracing::warn;

const DOCUMENT_EXTENSION: &str = "json";

/// Root of all persisted documents.
///
/// Cloning is cheap; clones share the same set of open documents.
#[derive(Clone, Debug)]
pub struct Store {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    root: PathBuf,
    documents: Mutex<HashMap<PathBuf, Document>>,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                root: root.into(),
                documents: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Get or open the document at `relative` (a `.json` extension is added if missing).
    ///
    /// Two calls with the same path return handles to the same worker.
    /// Must be called from within a tokio runtime.
    pub fn document(&self, relative: impl AsRef<Path>) -> Document {
        let path = self.resolve(relative.as_ref());
        let mut documents = self
            .inner
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        documents
            .entry(path)
            .or_insert_with_key(|path| Document::open(path.clone()))
            .clone()
    }

    /// Documents present on disk under `namespace`, as paths relative to the root.
    pub async fn list(&self, namespace: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let namespace = namespace.as_ref();
        let dir = self.inner.root.join(namespace);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(PersistenceError::Io { path: dir, source }),
        };

        let mut found = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => {
                    return Err(PersistenceError::Io {
                        path: dir.clone(),
                        source,
                    });
                }
            };

            let path = entry.path();
            let is_document = path
                .extension()
                .is_some_and(|ext| ext == DOCUMENT_EXTENSION);
            if is_document {
                found.push(namespace.join(entry.file_name()));
            }
        }

        found.sort();
        Ok(found)
    }

    /// Already-open documents whose path lies under `namespace`.
    pub fn open_documents(&self, namespace: impl AsRef<Path>) -> Vec<Document> {
        let prefix = self.inner.root.join(namespace.as_ref());
        let documents = self
            .inner
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        documents
            .iter()
            .filter(|(path, _)| path.starts_with(&prefix))
            .map(|(_, document)| document.clone())
            .collect()
    }

    fn resolve(&self, relative: &Path) -> PathBuf {
        let mut path = self.inner.root.join(relative);
        if path.extension().is_none() {
            path.set_extension(DOCUMENT_EXTENSION);
        }
        path
    }
}

/// A save running in the background.
///
/// Failures are logged when they happen; awaiting [`PendingSave::wait`] is
/// optional and only needed by callers that want the outcome.
#[derive(Debug)]
pub struct PendingSave {
    handle: JoinHandle<Result<()>>,
}

impl PendingSave {
    pub fn spawn<F>(save: F) -> Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let result = save.await;
            if let Err(e) = &result {
                warn!("Background save failed: {}", e);
            }
            result
        });
        Self { handle }
    }

    pub async fn wait(self) -> Result<()> {
        self.handle.await.map_err(PersistenceError::Task)?
    }
}
