//! Event configuration loader.

use std::collections::HashMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

use crate::loaders::{LoadResult, read_file};

/// Raw event configuration as written by server operators.
///
/// ```toml
/// default-mode = "solo"
///
/// [modes.solo]
/// spawn = ["location"]
/// items = ["salmon"]
///
/// [modes.teams]
/// spawn = ["teams"]
///
/// [messages]
/// joining.self = "Welcome to the event!"
/// "leaving.self" = "See you next time."
/// ```
///
/// Modes keep their file order; the first one is the last-resort default.
/// Message keys may be dotted, quoted or written as nested tables.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EventConfig {
    #[serde(default)]
    pub default_mode: Option<String>,
    #[serde(default)]
    pub modes: IndexMap<String, ModeSection>,
    #[serde(default, deserialize_with = "flatten_messages")]
    pub messages: HashMap<String, String>,
}

/// One `[modes.<name>]` table.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ModeSection {
    #[serde(default)]
    pub spawn: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
}

impl EventConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> LoadResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Read `[messages]` into `section.key` paths.
fn flatten_messages<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let table = toml::Table::deserialize(deserializer)?;
    let mut messages = HashMap::new();
    flatten_into(&mut messages, None, table);
    Ok(messages)
}

fn flatten_into(messages: &mut HashMap<String, String>, prefix: Option<&str>, table: toml::Table) {
    for (key, value) in table {
        let key = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key,
        };
        match value {
            toml::Value::String(template) => {
                messages.insert(key, template);
            }
            toml::Value::Table(nested) => flatten_into(messages, Some(&key), nested),
            other => tracing::warn!(
                "Ignoring message '{}': expected a string, found {}",
                key,
                other.type_str()
            ),
        }
    }
}

/// Loader for the event configuration file.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load the configuration from a TOML file.
    pub fn load(path: &Path) -> LoadResult<EventConfig> {
        let content = read_file(path)?;
        let config = EventConfig::from_toml(&content)?;

        tracing::debug!(
            "Loaded event config from {} ({} modes)",
            path.display(),
            config.modes.len()
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::ConfigError;
    use tempfile::TempDir;

    #[test]
    fn test_modes_keep_file_order() {
        let config = EventConfig::from_toml(
            r#"
            [modes.zeta]
            spawn = ["location"]

            [modes.alpha]
            spawn = ["teams"]
            items = ["salmon", "bread"]
            "#,
        )
        .unwrap();

        let names: Vec<_> = config.modes.keys().cloned().collect();
        assert_eq!(names, ["zeta", "alpha"]);
        assert_eq!(config.modes["alpha"].items, ["salmon", "bread"]);
        assert!(config.default_mode.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "default-mode = \"solo\"\n[modes.solo]\nspawn = [\"location\"]\n[messages]\n\"ended\" = \"Over!\"\n",
        )
        .unwrap();

        let config = ConfigLoader::load(&path).unwrap();
        assert_eq!(config.default_mode.as_deref(), Some("solo"));
        assert_eq!(config.messages["ended"], "Over!");
    }

    #[test]
    fn test_message_keys_in_every_toml_form() {
        let config = EventConfig::from_toml(
            r#"
            [messages]
            joining.self = "Welcome!"
            "joining.announce" = "{0} is here"
            mode.set = "Mode is now {0}"
            ended = 3

            [messages.leaving]
            self = "Bye"
            "#,
        )
        .unwrap();

        assert_eq!(config.messages["joining.self"], "Welcome!");
        assert_eq!(config.messages["joining.announce"], "{0} is here");
        assert_eq!(config.messages["mode.set"], "Mode is now {0}");
        assert_eq!(config.messages["leaving.self"], "Bye");
        assert!(!config.messages.contains_key("ended"));
        assert_eq!(config.messages.len(), 4);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = ConfigLoader::load(&temp_dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
