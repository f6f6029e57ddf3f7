//! Catalog of event modes built from configuration.

use event_core::{Mode, SpawnKind};
use indexmap::IndexMap;
use tracing::{info, warn};

use crate::loaders::EventConfig;

/// Immutable, ordered catalog of the registered event modes.
///
/// Iteration follows registration order, which is the order of the
/// `[modes.*]` tables in the configuration file.
#[derive(Clone, Debug, Default)]
pub struct ModeRegistry {
    modes: IndexMap<String, Mode>,
}

impl ModeRegistry {
    /// Build the registry from configuration.
    ///
    /// Modes without spawn parameters, or whose spawn parameters are all
    /// unknown, are skipped. Unknown spawn tokens are ignored individually.
    pub fn from_config(config: &EventConfig) -> Self {
        let mut modes = IndexMap::with_capacity(config.modes.len());

        for (name, section) in &config.modes {
            if section.spawn.is_empty() {
                info!("Skipping {} mode section: missing spawn parameters", name);
                continue;
            }

            let mut spawns = Vec::with_capacity(section.spawn.len());
            for token in &section.spawn {
                match token.parse::<SpawnKind>() {
                    Ok(kind) => spawns.push(kind),
                    Err(_) => warn!("Ignoring unknown spawn type '{}' in mode {}", token, name),
                }
            }

            if spawns.is_empty() {
                warn!("Skipped {} mode section: no valid spawn parameters", name);
                continue;
            }

            let mode = Mode::new(name.clone(), &spawns, section.items.iter().cloned());
            modes.insert(name.clone(), mode);
        }

        Self { modes }
    }

    pub fn get(&self, name: &str) -> Option<&Mode> {
        self.modes.get(name)
    }

    /// Registered mode names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.modes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Pick the mode to activate at startup.
    ///
    /// Preference: the last persisted mode if it is still registered, then the
    /// configured default, then the first registered mode. Returns `None` only
    /// when no mode is registered at all.
    pub fn resolve_active(&self, last_mode: Option<&str>, default_mode: Option<&str>) -> Option<&Mode> {
        if let Some(last) = last_mode {
            match self.get(last) {
                Some(mode) => return Some(mode),
                None => warn!("Persisted mode '{}' is no longer registered", last),
            }
        }

        default_mode
            .and_then(|name| self.get(name))
            .or_else(|| self.modes.values().next())
    }

    /// Collect every reward item key referenced by any mode.
    pub fn reward_item_keys(&self) -> std::collections::BTreeSet<String> {
        self.modes
            .values()
            .flat_map(|mode| mode.reward_items.iter().cloned())
            .collect()
    }
}
