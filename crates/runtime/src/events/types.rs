//! Event payloads published by the coordinator.

use event_core::{Location, PlayerId, SessionId};
use serde::{Deserialize, Serialize};

/// Session lifecycle and membership changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    Started {
        session: SessionId,
    },
    /// `members` is the number of players flushed out by the end.
    Ended {
        session: SessionId,
        members: usize,
    },
    PlayerJoined {
        session: SessionId,
        player: PlayerId,
    },
    PlayerLeft {
        session: SessionId,
        player: PlayerId,
    },
}

/// Committed configuration changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigEvent {
    ModeChanged {
        from: String,
        to: String,
    },
    LocationChanged {
        location: Option<Location>,
    },
    TeamLocationChanged {
        team: String,
        location: Option<Location>,
    },
}
