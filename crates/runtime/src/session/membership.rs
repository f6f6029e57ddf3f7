//! A player's membership in a session and the way back to where they came from.

use std::future::Future;
use std::sync::Arc;

use event_core::{Location, PlayerId, SessionId};
use tracing::{debug, warn};

use crate::api::Participant;
use crate::ledger::PlayerLedger;
use crate::store::Result;

/// Resolves a player's captured location when asked, not when created.
#[derive(Clone, Debug)]
pub struct ReturnPoint {
    player: PlayerId,
    ledger: PlayerLedger,
}

impl ReturnPoint {
    pub fn new(player: PlayerId, ledger: PlayerLedger) -> Self {
        Self { player, ledger }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// The lookup is queued on the player's document immediately.
    pub fn resolve(&self) -> impl Future<Output = Result<Option<Location>>> + Send + use<> {
        self.ledger.original_location(self.player)
    }
}

#[derive(Clone)]
pub struct EventMembership {
    session: SessionId,
    participant: Arc<dyn Participant>,
    return_point: ReturnPoint,
}

impl EventMembership {
    pub(crate) fn new(
        session: SessionId,
        participant: Arc<dyn Participant>,
        ledger: PlayerLedger,
    ) -> Self {
        let return_point = ReturnPoint::new(participant.id(), ledger);
        Self {
            session,
            participant,
            return_point,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn player(&self) -> PlayerId {
        self.return_point.player
    }

    pub fn participant(&self) -> &Arc<dyn Participant> {
        &self.participant
    }

    pub fn return_point(&self) -> &ReturnPoint {
        &self.return_point
    }

    pub fn teleport_to(&self, location: &Location) {
        self.participant.teleport(location);
    }

    /// Send the player back to their captured location.
    ///
    /// Resolves to `false` when nothing was captured or the lookup failed.
    pub fn teleport_back(&self) -> impl Future<Output = bool> + Send + use<> {
        let lookup = self.return_point.resolve();
        let participant = Arc::clone(&self.participant);
        let player = self.player();

        async move {
            match lookup.await {
                Ok(Some(location)) => {
                    participant.teleport(&location);
                    true
                }
                Ok(None) => {
                    debug!("No return location recorded for {}", player);
                    false
                }
                Err(e) => {
                    warn!("Unable to look up return location of {}: {}", player, e);
                    false
                }
            }
        }
    }
}

impl std::fmt::Debug for EventMembership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventMembership")
            .field("session", &self.session)
            .field("player", &self.player())
            .finish()
    }
}
