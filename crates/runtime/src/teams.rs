//! Team name to spawn location mapping.
//!
//! The directory lives in the `teams` section of the coordinator document and
//! is persisted as a whole on every change.

use std::collections::{BTreeMap, BTreeSet};

use event_core::Location;
use serde_json::Value;
use tracing::warn;

use crate::api::{EventError, Result};
use crate::store::{Document, PATH_SEPARATOR, PendingSave};

const TEAMS_KEY: &str = "teams";

#[derive(Debug)]
pub struct TeamDirectory {
    document: Document,
    teams: BTreeMap<String, Location>,
}

impl TeamDirectory {
    /// Read `teams.*` from `document`, skipping entries that are not locations.
    pub async fn load(document: Document) -> Result<Self> {
        let entries = document
            .read(|data| {
                data.get(TEAMS_KEY)
                    .and_then(Value::as_object)
                    .map(|section| {
                        section
                            .iter()
                            .map(|(team, value)| (team.clone(), value.clone()))
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default()
            })
            .await?;

        let mut teams = BTreeMap::new();
        for (team, value) in entries {
            match serde_json::from_value::<Location>(value) {
                Ok(location) => {
                    teams.insert(team, location);
                }
                Err(e) => warn!("Skipping team '{}': invalid location: {}", team, e),
            }
        }

        Ok(Self { document, teams })
    }

    /// Snapshot of every team location; `None` if no team is configured.
    pub fn locations(&self) -> Option<BTreeMap<String, Location>> {
        (!self.teams.is_empty()).then(|| self.teams.clone())
    }

    /// Configured team names; `None` if no team is configured.
    pub fn teams(&self) -> Option<BTreeSet<String>> {
        (!self.teams.is_empty()).then(|| self.teams.keys().cloned().collect())
    }

    pub fn get(&self, team: &str) -> Option<Location> {
        self.teams.get(team).cloned()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Set or (with `None`) remove the location of `team`, then persist.
    ///
    /// Fails with [`EventError::InvalidTeamName`] before touching anything if
    /// the name is empty or contains the path separator.
    pub fn set_location(&mut self, team: &str, location: Option<Location>) -> Result<PendingSave> {
        validate_team_name(team)?;

        match location {
            Some(location) => {
                self.teams.insert(team.to_string(), location);
            }
            None => {
                self.teams.remove(team);
            }
        }

        let snapshot = self.teams.clone();
        let saved = self
            .document
            .try_update_and_save(move |data| data.set(TEAMS_KEY, &snapshot));

        Ok(PendingSave::spawn(saved))
    }
}

pub fn validate_team_name(team: &str) -> Result<()> {
    if team.is_empty() || team.contains(PATH_SEPARATOR) {
        return Err(EventError::InvalidTeamName(team.to_string()));
    }
    Ok(())
}
