//! User-facing message templates.

use std::collections::HashMap;

use event_core::MessageId;
use tracing::warn;

use crate::loaders::EventConfig;

/// Message templates keyed by [`MessageId`], with built-in fallbacks.
#[derive(Clone, Debug, Default)]
pub struct MessageCatalog {
    overrides: HashMap<MessageId, String>,
}

impl MessageCatalog {
    /// Build the catalog from the `[messages]` table. Unknown keys are ignored.
    pub fn from_config(config: &EventConfig) -> Self {
        let mut overrides = HashMap::with_capacity(config.messages.len());
        for (key, template) in &config.messages {
            match key.parse::<MessageId>() {
                Ok(id) => {
                    overrides.insert(id, template.clone());
                }
                Err(_) => warn!("Ignoring unknown message key '{}'", key),
            }
        }
        Self { overrides }
    }

    /// Raw template for `id`.
    pub fn template(&self, id: MessageId) -> &str {
        self.overrides
            .get(&id)
            .map(String::as_str)
            .unwrap_or_else(|| id.default_template())
    }

    /// Template for `id` without replacements.
    pub fn get(&self, id: MessageId) -> String {
        self.template(id).to_string()
    }

    /// Template for `id` with `{0}`, `{1}`, ... replaced by `args`.
    pub fn render(&self, id: MessageId, args: &[&dyn std::fmt::Display]) -> String {
        let mut text = self.template(id).to_string();
        for (index, arg) in args.iter().enumerate() {
            text = text.replace(&format!("{{{}}}", index), &arg.to_string());
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_fall_back_to_defaults() {
        let config = EventConfig::from_toml(
            r#"
            [messages]
            "joining.self" = "Welcome!"
            "not.a.key" = "ignored"
            "#,
        )
        .unwrap();
        let catalog = MessageCatalog::from_config(&config);

        assert_eq!(catalog.get(MessageId::JoinSelf), "Welcome!");
        assert_eq!(catalog.get(MessageId::Ended), MessageId::Ended.default_template());
    }

    #[test]
    fn test_dotted_keys_resolve_to_message_ids() {
        let config = EventConfig::from_toml(
            r#"
            [messages]
            joining.self = "Welcome!"
            leaving.force-end = "The event is over."
            "#,
        )
        .unwrap();
        let catalog = MessageCatalog::from_config(&config);

        assert_eq!(catalog.get(MessageId::JoinSelf), "Welcome!");
        assert_eq!(catalog.get(MessageId::LeaveForceEnd), "The event is over.");
    }

    #[test]
    fn test_render_replaces_positional_arguments() {
        let catalog = MessageCatalog::default();
        let text = catalog.render(MessageId::Assigned, &[&"Alex", &"red"]);
        assert_eq!(text, "Assigned Alex to team red.");
    }
}
