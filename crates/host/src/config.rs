//! Host bootstrap configuration read from the environment.
use std::env;
use std::path::PathBuf;

use event_runtime::CoordinatorConfig;

/// Configuration written to the data directory on first start.
pub const DEFAULT_EVENT_CONFIG: &str = r#"default-mode = "solo"

[modes.solo]
spawn = ["location"]
items = ["salmon"]

[modes.teams]
spawn = ["teams"]
"#;

#[derive(Clone, Debug)]
pub struct HostConfig {
    pub data_dir: PathBuf,
    pub config_path: PathBuf,
    pub coordinator: CoordinatorConfig,
}

impl HostConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `EVENTS_DATA_DIR` - Directory holding persisted event data (default: `./data`)
    /// - `EVENTS_CONFIG` - Event configuration file (default: `<data dir>/config.toml`)
    /// - `EVENTS_COMMAND_BUFFER` - Coordinator command queue size (default: 32)
    /// - `EVENTS_BUS_CAPACITY` - Per-topic event bus capacity (default: 64)
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = var("EVENTS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data"));
        let config_path = var("EVENTS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut coordinator = CoordinatorConfig::default();
        if let Some(size) = parse(&var, "EVENTS_COMMAND_BUFFER") {
            coordinator.command_buffer_size = size;
        }
        if let Some(capacity) = parse(&var, "EVENTS_BUS_CAPACITY") {
            coordinator.event_bus_capacity = capacity;
        }

        Self {
            data_dir,
            config_path,
            coordinator,
        }
    }
}

fn parse(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let value: usize = var(key)?.parse().ok()?;
    Some(value.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HostConfig::from_vars(vars(&[]));
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.config_path, PathBuf::from("data/config.toml"));
        assert_eq!(config.coordinator.command_buffer_size, 32);
        assert_eq!(config.coordinator.event_bus_capacity, 64);
    }

    #[test]
    fn test_overrides_and_minimums() {
        let config = HostConfig::from_vars(vars(&[
            ("EVENTS_DATA_DIR", "/srv/events"),
            ("EVENTS_COMMAND_BUFFER", "0"),
            ("EVENTS_BUS_CAPACITY", "not a number"),
        ]));
        assert_eq!(config.config_path, PathBuf::from("/srv/events/config.toml"));
        assert_eq!(config.coordinator.command_buffer_size, 1);
        assert_eq!(config.coordinator.event_bus_capacity, 64);
    }

    #[test]
    fn test_default_config_parses() {
        let config = event_content::EventConfig::from_toml(DEFAULT_EVENT_CONFIG).unwrap();
        assert_eq!(config.default_mode.as_deref(), Some("solo"));
        assert_eq!(config.modes.len(), 2);
    }
}
