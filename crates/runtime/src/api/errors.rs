//! Error types surfaced by the event runtime API.
//!
//! User-recoverable failures map to a localized message through
//! [`EventError::user_message`]; the remaining variants signal bugs or
//! infrastructure problems and are meant for logs.
use std::sync::Arc;

use event_content::{ConfigError, MessageCatalog};
use event_core::{MessageId, PlayerId, SessionId};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::coordinator::CoordinatorId;
use crate::session::EventSession;
use crate::store::PersistenceError;

pub type Result<T> = std::result::Result<T, EventError>;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("player {0} is already in the event")]
    AlreadyPresent(PlayerId),

    #[error("player {0} is not in the event")]
    NotPresent(PlayerId),

    #[error("player {0} must empty their inventory before joining")]
    InventoryNotClear(PlayerId),

    #[error("event {} is already running", .0.id())]
    EventAlreadyRunning(Arc<EventSession>),

    #[error("unknown event mode '{0}'")]
    InvalidMode(String),

    #[error("invalid team name '{0}': team names cannot be empty or contain '.'")]
    InvalidTeamName(String),

    #[error("session {session} is owned by coordinator {expected}, not {provided}")]
    ArgumentMismatch {
        session: SessionId,
        expected: CoordinatorId,
        provided: CoordinatorId,
    },

    #[error("session {0} has already ended")]
    SessionEnded(SessionId),

    #[error("no event is running")]
    NoEvent,

    #[error("no team locations are configured")]
    NoTeams,

    #[error("no valid event modes are configured")]
    NoModes,

    #[error("event coordinator command channel closed")]
    CommandChannelClosed,

    #[error("event coordinator reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EventError {
    /// Message id shown to the player who triggered the failure, if any.
    pub fn message_id(&self) -> Option<MessageId> {
        let id = match self {
            Self::AlreadyPresent(_) => MessageId::JoinAlreadyIn,
            Self::NotPresent(_) => MessageId::LeaveNotIn,
            Self::InventoryNotClear(_) => MessageId::EmptyInventory,
            Self::EventAlreadyRunning(_) => MessageId::EventRunning,
            Self::InvalidMode(_) => MessageId::ModeInvalid,
            Self::InvalidTeamName(_) => MessageId::InvalidTeam,
            Self::SessionEnded(_) | Self::NoEvent => MessageId::NoEvent,
            Self::NoTeams => MessageId::NoTeams,
            Self::ArgumentMismatch { .. }
            | Self::NoModes
            | Self::CommandChannelClosed
            | Self::ReplyChannelClosed(_)
            | Self::Persistence(_)
            | Self::Config(_) => return None,
        };
        Some(id)
    }

    /// Localized text for user-recoverable failures; `None` for internal ones.
    pub fn user_message(&self, messages: &MessageCatalog) -> Option<String> {
        self.message_id().map(|id| messages.get(id))
    }

    /// Whether this error points at a bug or an infrastructure failure.
    pub fn is_internal(&self) -> bool {
        self.message_id().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_errors_have_messages() {
        let messages = MessageCatalog::default();
        let player = PlayerId::new_random();

        let text = EventError::InventoryNotClear(player)
            .user_message(&messages)
            .unwrap();
        assert_eq!(text, MessageId::EmptyInventory.default_template());
        assert!(EventError::NoTeams.user_message(&messages).is_some());
    }

    #[test]
    fn test_internal_errors_have_no_message() {
        let messages = MessageCatalog::default();
        let err = EventError::ArgumentMismatch {
            session: SessionId::new_random(),
            expected: CoordinatorId::new(),
            provided: CoordinatorId::new(),
        };

        assert!(err.is_internal());
        assert!(err.user_message(&messages).is_none());
        assert!(EventError::CommandChannelClosed.is_internal());
    }
}
