//! Persisted return locations of event participants.
//!
//! Each player gets a `users/<uuid>.json` document holding the location they
//! had when they joined. Submissions are synchronous; completion is reported
//! through the returned futures.

use std::future::Future;
use std::path::PathBuf;

use event_core::{Location, PlayerId};
use tracing::{debug, warn};

use crate::store::{Document, Result, Store};

const USERS_NAMESPACE: &str = "users";
const ORIGINAL_LOCATION_KEY: &str = "original-location";

#[derive(Clone, Debug)]
pub struct PlayerLedger {
    store: Store,
}

impl PlayerLedger {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Record `location` as the place `player` returns to, then save.
    /// Last write wins.
    pub fn capture_original_location(
        &self,
        player: PlayerId,
        location: Location,
    ) -> impl Future<Output = Result<()>> + Send + use<> {
        let saved = self
            .document(player)
            .try_update_and_save(move |data| data.set(ORIGINAL_LOCATION_KEY, &location));

        async move {
            saved.await?;
            debug!("Captured original location of {}", player);
            Ok(())
        }
    }

    /// Location captured for `player`, if any.
    pub fn original_location(
        &self,
        player: PlayerId,
    ) -> impl Future<Output = Result<Option<Location>>> + Send + use<> {
        self.document(player)
            .read(|data| data.get_as::<Location>(ORIGINAL_LOCATION_KEY))
    }

    /// Remove the record of `player`. Resolves to whether a file existed.
    pub fn clear(&self, player: PlayerId) -> impl Future<Output = Result<bool>> + Send + use<> {
        self.document(player).delete()
    }

    /// Remove every player record, open or left on disk by an earlier run.
    ///
    /// Best-effort: individual failures are logged and skipped. Returns the
    /// number of files removed.
    pub async fn clear_all(&self) -> usize {
        let mut documents = self.store.open_documents(USERS_NAMESPACE);

        match self.store.list(USERS_NAMESPACE).await {
            Ok(paths) => {
                for path in paths {
                    let document = self.store.document(&path);
                    if !documents.iter().any(|open| open.path() == document.path()) {
                        documents.push(document);
                    }
                }
            }
            Err(e) => warn!("Unable to list player records: {}", e),
        }

        let deletions: Vec<_> = documents
            .iter()
            .map(|document| (document.path().to_path_buf(), document.delete()))
            .collect();

        let mut removed = 0;
        for (path, deletion) in deletions {
            match deletion.await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!("Unable to clear player record {}: {}", path.display(), e),
            }
        }

        debug!("Cleared {} player records", removed);
        removed
    }

    fn document(&self, player: PlayerId) -> Document {
        self.store.document(record_path(player))
    }
}

fn record_path(player: PlayerId) -> PathBuf {
    PathBuf::from(USERS_NAMESPACE).join(format!("{}.json", player))
}
