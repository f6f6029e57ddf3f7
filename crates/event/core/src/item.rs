use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Description of a reward item as stored under `items/`.
///
/// Turning this into a real item stack is up to the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub enchantments: BTreeMap<String, u32>,
}

impl ItemSpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: None,
            enchantments: BTreeMap::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_enchantment(mut self, enchantment: impl Into<String>, level: u32) -> Self {
        self.enchantments.insert(enchantment.into(), level);
        self
    }
}
