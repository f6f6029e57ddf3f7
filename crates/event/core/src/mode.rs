use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// How players are placed when an event mode spawns them.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SpawnKind {
    /// Everyone goes to the single shared event location.
    Location,
    /// Players are spread over the configured team locations.
    Teams,
}

/// Immutable descriptor of an event mode.
///
/// Modes carry no behavior of their own; the coordinator reads the flags
/// when it places players and hands out rewards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    pub name: String,
    pub uses_shared_location: bool,
    pub uses_team_locations: bool,
    pub reward_items: BTreeSet<String>,
}

impl Mode {
    pub fn new(
        name: impl Into<String>,
        spawns: &[SpawnKind],
        reward_items: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            name: name.into(),
            uses_shared_location: spawns.contains(&SpawnKind::Location),
            uses_team_locations: spawns.contains(&SpawnKind::Teams),
            reward_items: reward_items.into_iter().collect(),
        }
    }

    pub fn has_rewards(&self) -> bool {
        !self.reward_items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_kind_parses_case_insensitively() {
        assert_eq!("LOCATION".parse::<SpawnKind>().unwrap(), SpawnKind::Location);
        assert_eq!("Teams".parse::<SpawnKind>().unwrap(), SpawnKind::Teams);
        assert!("arena".parse::<SpawnKind>().is_err());
    }

    #[test]
    fn reward_items_collapse_duplicates() {
        let mode = Mode::new(
            "solo",
            &[SpawnKind::Location],
            ["salmon".to_string(), "salmon".to_string(), "bread".to_string()],
        );
        assert!(mode.uses_shared_location);
        assert!(!mode.uses_team_locations);
        assert_eq!(mode.reward_items.len(), 2);
    }
}
