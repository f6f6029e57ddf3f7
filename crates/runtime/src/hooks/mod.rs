//! Respawn hook system for host integration.
//!
//! The host calls [`HookRegistry::dispatch_respawn`] whenever a player is
//! about to respawn. Registered hooks run in priority order and may replace
//! the respawn location carried by the [`RespawnRequest`].
//!
//! Event sessions register a hook while they are active so members respawn
//! at the shared event location instead of their usual spawn point.

mod registry;

pub use registry::{HookId, HookRegistry};

use event_core::{Location, PlayerId};

/// A pending respawn, passed through every registered hook.
#[derive(Clone, Debug, PartialEq)]
pub struct RespawnRequest {
    player: PlayerId,
    location: Option<Location>,
}

impl RespawnRequest {
    /// `location` is the spawn point the host would use; `None` means the
    /// host default.
    pub fn new(player: PlayerId, location: Option<Location>) -> Self {
        Self { player, location }
    }

    pub fn player(&self) -> PlayerId {
        self.player
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = Some(location);
    }

    pub fn into_location(self) -> Option<Location> {
        self.location
    }
}

/// Reacts to a player respawn.
pub trait RespawnHook: Send + Sync {
    /// Hook name for logging.
    fn name(&self) -> &'static str;

    /// Execution priority (lower values run first).
    fn priority(&self) -> i32 {
        0
    }

    fn on_respawn(&self, request: &mut RespawnRequest);
}
