//! Reward item catalog loaded from `items/<key>.json`.
//!
//! Every reward key named by a mode refers to a document; each top-level
//! entry of that document is one catalog item. All documents merge into a
//! single catalog.

use std::collections::BTreeMap;
use std::path::PathBuf;

use event_core::{ItemSpec, Mode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::store::{Result, Store};

const ITEMS_NAMESPACE: &str = "items";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemCatalog {
    items: BTreeMap<String, ItemSpec>,
}

impl ItemCatalog {
    /// Load every item document named in `keys`. Missing documents contribute
    /// nothing; entries that do not describe an item are skipped with a warning.
    pub async fn load<I, S>(store: &Store, keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut items = BTreeMap::new();

        for key in keys {
            let key = key.as_ref();
            let document = store.document(PathBuf::from(ITEMS_NAMESPACE).join(format!("{key}.json")));
            let entries = document
                .read(|data| {
                    data.keys()
                        .filter_map(|name| Some((name.to_string(), data.get(name)?.clone())))
                        .collect::<Vec<(String, Value)>>()
                })
                .await?;

            if entries.is_empty() {
                debug!("No items found in item document '{}'", key);
            }

            for (name, value) in entries {
                match serde_json::from_value::<ItemSpec>(value) {
                    Ok(spec) => {
                        items.insert(name, spec);
                    }
                    Err(e) => warn!("Skipping invalid item '{}' in '{}': {}", name, key, e),
                }
            }
        }

        Ok(Self { items })
    }

    pub fn get(&self, key: &str) -> Option<&ItemSpec> {
        self.items.get(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Reward items of `mode` that exist in the catalog.
    pub fn resolve(&self, mode: &Mode) -> Vec<ItemSpec> {
        mode.reward_items
            .iter()
            .filter_map(|key| self.items.get(key).cloned())
            .collect()
    }
}

impl FromIterator<(String, ItemSpec)> for ItemCatalog {
    fn from_iter<T: IntoIterator<Item = (String, ItemSpec)>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_core::SpawnKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_merges_documents_and_skips_invalid() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("items")).unwrap();
        std::fs::write(
            temp.path().join("items/salmon.json"),
            br#"{
                "salmon": {"type": "COOKED_SALMON", "name": "&6Event Salmon"},
                "broken": {"name": "no type"}
            }"#,
        )
        .unwrap();
        std::fs::write(
            temp.path().join("items/sword.json"),
            br#"{"sword": {"type": "IRON_SWORD", "enchantments": {"sharpness": 2}}}"#,
        )
        .unwrap();

        let store = Store::new(temp.path());
        let catalog = ItemCatalog::load(&store, ["salmon", "sword", "missing"])
            .await
            .unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("broken").is_none());
        assert_eq!(
            catalog.get("sword"),
            Some(&ItemSpec::new("IRON_SWORD").with_enchantment("sharpness", 2))
        );
    }

    #[test]
    fn test_resolve_skips_unknown_rewards() {
        let catalog: ItemCatalog = [("salmon".to_string(), ItemSpec::new("COOKED_SALMON"))]
            .into_iter()
            .collect();
        let mode = Mode::new(
            "solo",
            &[SpawnKind::Location],
            ["salmon".to_string(), "cake".to_string()],
        );

        assert_eq!(catalog.resolve(&mode), [ItemSpec::new("COOKED_SALMON")]);
    }
}
