//! Document handles and their in-memory state.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::error::{PersistenceError, Result};
use super::worker::{DocumentWorker, Job};

/// Separator between the segments of a key path (`teams.red`).
pub const PATH_SEPARATOR: char = '.';

/// In-memory state of one document: a JSON object addressed by dotted paths.
#[derive(Debug, Default)]
pub struct DocumentData {
    root: Map<String, Value>,
    dirty: bool,
}

impl DocumentData {
    pub(crate) fn from_root(root: Map<String, Value>) -> Self {
        Self { root, dirty: false }
    }

    pub(crate) fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn reset(&mut self) {
        self.root.clear();
        self.dirty = false;
    }

    /// Whether the state changed since it was last loaded or saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split(PATH_SEPARATOR);
        let mut node = self.root.get(segments.next()?)?;
        for segment in segments {
            node = node.as_object()?.get(segment)?;
        }
        Some(node)
    }

    /// Deserialize the value at `path`, or `None` if it is absent or has the wrong shape.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let value = self.get(path)?;
        match T::deserialize(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Ignoring unparsable value at '{}': {}", path, e);
                None
            }
        }
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Top-level keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.root.keys().map(String::as_str)
    }

    /// Keys of the object stored at `path`; empty if there is none.
    pub fn section_keys(&self, path: &str) -> Vec<String> {
        self.get(path)
            .and_then(Value::as_object)
            .map(|section| section.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Store `value` at `path`, creating intermediate sections as needed.
    pub fn set_value(&mut self, path: &str, value: Value) {
        let mut segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
        let Some(last) = segments.pop() else {
            return;
        };

        let mut node = &mut self.root;
        for segment in segments {
            let entry = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(section) = entry else {
                return;
            };
            node = section;
        }

        node.insert(last.to_string(), value);
        self.dirty = true;
    }

    /// Serialize and store `value` at `path`.
    pub fn set<T: Serialize + ?Sized>(&mut self, path: &str, value: &T) -> serde_json::Result<()> {
        let value = serde_json::to_value(value)?;
        self.set_value(path, value);
        Ok(())
    }

    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let (parent, key) = match path.rsplit_once(PATH_SEPARATOR) {
            Some((parent, key)) => (self.section_mut(parent)?, key),
            None => (&mut self.root, path),
        };

        let removed = parent.remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.root.is_empty() {
            self.root.clear();
            self.dirty = true;
        }
    }

    fn section_mut(&mut self, path: &str) -> Option<&mut Map<String, Value>> {
        let mut node = &mut self.root;
        for segment in path.split(PATH_SEPARATOR) {
            node = node.get_mut(segment)?.as_object_mut()?;
        }
        Some(node)
    }
}

/// Handle to a file-backed document.
///
/// All operations are queued on the document's private worker at call time
/// and run in submission order. The returned futures only report completion;
/// dropping one does not cancel the queued operation.
#[derive(Clone)]
pub struct Document {
    path: Arc<PathBuf>,
    jobs: mpsc::UnboundedSender<Job>,
}

impl Document {
    /// Spawn the worker for `path`. Must be called from within a tokio runtime.
    pub(crate) fn open(path: PathBuf) -> Self {
        let path = Arc::new(path);
        let (jobs, rx) = mpsc::unbounded_channel();

        let worker = DocumentWorker::new(Arc::clone(&path), rx);
        tokio::spawn(worker.run());

        Self { path, jobs }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` against the current state.
    pub fn read<R, F>(&self, op: F) -> impl Future<Output = Result<R>> + Send + use<R, F>
    where
        F: FnOnce(&DocumentData) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.apply(move |data| op(data))
    }

    /// Run `op` and block the current thread until it has completed.
    ///
    /// Only for synchronous startup and shutdown paths; calling this from
    /// inside an async task panics.
    pub fn read_now<R, F>(&self, op: F) -> Result<R>
    where
        F: FnOnce(&DocumentData) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.submit(Job::Apply(Box::new(move |data| {
            let _ = reply_tx.send(op(data));
        })))?;

        reply_rx.blocking_recv().map_err(|_| self.closed())
    }

    /// Mutate the state. Ordered with reads and other updates of this document.
    pub fn update<R, F>(&self, op: F) -> impl Future<Output = Result<R>> + Send + use<R, F>
    where
        F: FnOnce(&mut DocumentData) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.apply(op)
    }

    /// Write the state to disk (temp file plus rename).
    pub fn save(&self) -> impl Future<Output = Result<()>> + Send + use<> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let submitted = self.submit(Job::Save { reply: reply_tx });
        self.reply(submitted, reply_rx)
    }

    /// Clear the state and remove the file. Resolves to whether a file existed.
    pub fn delete(&self) -> impl Future<Output = Result<bool>> + Send + use<> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let submitted = self.submit(Job::Delete { reply: reply_tx });
        self.reply(submitted, reply_rx)
    }

    /// Apply `op` then save, both queued now.
    pub fn update_and_save<F>(&self, op: F) -> impl Future<Output = Result<()>> + Send + use<F>
    where
        F: FnOnce(&mut DocumentData) + Send + 'static,
    {
        let updated = self.update(op);
        let saved = self.save();
        async move {
            updated.await?;
            saved.await
        }
    }

    /// Like [`Document::update_and_save`] for ops that serialize values.
    ///
    /// A serialization failure is reported as [`PersistenceError::Json`];
    /// the save still runs and writes whatever state the op left behind.
    pub fn try_update_and_save<F>(&self, op: F) -> impl Future<Output = Result<()>> + Send + use<F>
    where
        F: FnOnce(&mut DocumentData) -> serde_json::Result<()> + Send + 'static,
    {
        let path = self.path.to_path_buf();
        let updated = self.update(op);
        let saved = self.save();
        async move {
            updated
                .await?
                .map_err(|source| PersistenceError::Json { path, source })?;
            saved.await
        }
    }

    fn apply<R, F>(&self, op: F) -> impl Future<Output = Result<R>> + Send + use<R, F>
    where
        F: FnOnce(&mut DocumentData) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let submitted = self.submit(Job::Apply(Box::new(move |data| {
            let _ = reply_tx.send(op(data));
        })));

        let closed = self.closed();
        async move {
            submitted?;
            reply_rx.await.map_err(|_| closed)
        }
    }

    fn reply<T: Send + 'static>(
        &self,
        submitted: Result<()>,
        reply_rx: oneshot::Receiver<Result<T>>,
    ) -> impl Future<Output = Result<T>> + Send + use<T> {
        let closed = self.closed();
        async move {
            submitted?;
            reply_rx.await.map_err(|_| closed)?
        }
    }

    fn submit(&self, job: Job) -> Result<()> {
        self.jobs.send(job).map_err(|_| self.closed())
    }

    fn closed(&self) -> PersistenceError {
        PersistenceError::Closed {
            path: self.path.to_path_buf(),
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_set_get_remove() {
        let mut data = DocumentData::default();
        data.set_value("teams.red", json!({"x": 1.0}));
        data.set_value("teams.blue", json!({"x": 2.0}));
        data.set_value("status", json!("active"));
        assert!(data.is_dirty());

        assert_eq!(data.get_str("status"), Some("active"));
        assert_eq!(data.get("teams.red.x"), Some(&json!(1.0)));

        let mut teams = data.section_keys("teams");
        teams.sort();
        assert_eq!(teams, ["blue", "red"]);

        assert!(data.remove("teams.red").is_some());
        assert!(data.remove("teams.green").is_none());
        assert!(data.remove("nothing.here").is_none());
        assert_eq!(data.section_keys("teams"), ["blue"]);
    }

    #[test]
    fn test_set_replaces_scalar_with_section() {
        let mut data = DocumentData::default();
        data.set_value("teams", json!("not a section"));
        data.set_value("teams.red", json!(1));
        assert_eq!(data.get("teams.red"), Some(&json!(1)));
    }

    #[test]
    fn test_get_as_ignores_wrong_shape() {
        let mut data = DocumentData::default();
        data.set_value("count", json!("three"));
        assert_eq!(data.get_as::<u32>("count"), None);

        data.set("count", &3u32).unwrap();
        assert_eq!(data.get_as::<u32>("count"), Some(3));
    }
}
