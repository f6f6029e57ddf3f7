//! Event sessions: membership, team placement and the end-of-event flush.
//!
//! A session is `Active` from creation until [`EventSession::end_event`]
//! moves it to `Ended`, which is terminal. Membership changes happen under a
//! single short lock; broadcasts and the end flush work on snapshots.

mod membership;
mod teams;

pub use membership::{EventMembership, ReturnPoint};
pub use teams::{TeamRoster, assign_round_robin};

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use event_content::MessageCatalog;
use event_core::{Location, MessageId, PlayerId, SessionId};
use indexmap::IndexMap;
use indexmap::map::Entry;
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::{EventError, Participant, Result};
use crate::coordinator::CoordinatorId;
use crate::hooks::{HookId, HookRegistry, RespawnHook, RespawnRequest};
use crate::ledger::PlayerLedger;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    Active,
    Ended,
}

struct Roster {
    state: SessionState,
    /// Join order is kept so team assignment is reproducible for a given start.
    members: IndexMap<PlayerId, EventMembership>,
}

pub struct EventSession {
    id: SessionId,
    owner: CoordinatorId,
    ledger: PlayerLedger,
    messages: Arc<MessageCatalog>,
    shared_location: watch::Receiver<Option<Location>>,
    hooks: HookRegistry,
    respawn_hook: Mutex<Option<HookId>>,
    roster: Mutex<Roster>,
}

impl EventSession {
    /// Create an active session owned by `owner` and register its respawn hook.
    pub fn new(
        owner: CoordinatorId,
        ledger: PlayerLedger,
        messages: Arc<MessageCatalog>,
        shared_location: watch::Receiver<Option<Location>>,
        hooks: HookRegistry,
    ) -> Arc<Self> {
        let session = Arc::new_cyclic(|weak: &Weak<EventSession>| {
            let hook_id = hooks.register(Arc::new(SessionRespawnHook {
                session: weak.clone(),
            }));

            Self {
                id: SessionId::new_random(),
                owner,
                ledger,
                messages,
                shared_location,
                hooks,
                respawn_hook: Mutex::new(Some(hook_id)),
                roster: Mutex::new(Roster {
                    state: SessionState::Active,
                    members: IndexMap::new(),
                }),
            }
        });

        info!("Event session {} created", session.id);
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn owner(&self) -> CoordinatorId {
        self.owner
    }

    pub fn state(&self) -> SessionState {
        self.lock_roster().state
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Add `participant`, capturing their current location first.
    ///
    /// The membership check and the insert happen under one lock, so a
    /// player can never be added twice. Participant callbacks run before
    /// the lock is taken.
    pub fn add_player(&self, participant: Arc<dyn Participant>) -> Result<EventMembership> {
        let player = participant.id();
        let inventory_clear = participant.inventory_is_empty();
        let origin = participant.location();

        let mut roster = self.lock_roster();
        if roster.state == SessionState::Ended {
            return Err(EventError::SessionEnded(self.id));
        }

        let Entry::Vacant(slot) = roster.members.entry(player) else {
            return Err(EventError::AlreadyPresent(player));
        };
        if !inventory_clear {
            return Err(EventError::InventoryNotClear(player));
        }

        // Queued under the lock so it lands after any pending remove's clear.
        let capture = self.ledger.capture_original_location(player, origin);
        let membership = EventMembership::new(self.id, participant, self.ledger.clone());
        slot.insert(membership.clone());
        drop(roster);

        tokio::spawn(async move {
            if let Err(e) = capture.await {
                warn!("Failed to save original location of {}: {}", player, e);
            }
        });
        debug!("Player {} joined session {}", player, self.id);

        Ok(membership)
    }

    /// Remove `player`, send them back to their captured location and drop
    /// their ledger record.
    pub async fn remove_player(&self, player: PlayerId) -> Result<()> {
        let (returned, cleared) = {
            let mut roster = self.lock_roster();
            if roster.state == SessionState::Ended {
                return Err(EventError::SessionEnded(self.id));
            }
            let membership = roster
                .members
                .shift_remove(&player)
                .ok_or(EventError::NotPresent(player))?;

            // Lookup before clear, both queued before a re-add can capture.
            (membership.teleport_back(), self.ledger.clear(player))
        };

        returned.await;
        cleared.await?;
        debug!("Player {} left session {}", player, self.id);

        Ok(())
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.lock_roster().members.contains_key(&player)
    }

    /// Snapshot of the current members in join order.
    pub fn members(&self) -> Vec<EventMembership> {
        self.lock_roster().members.values().cloned().collect()
    }

    pub fn member_ids(&self) -> Vec<PlayerId> {
        self.lock_roster().members.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.lock_roster().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_roster().members.is_empty()
    }

    /// Deliver `message` to every member accepted by `predicate`.
    ///
    /// Recipients are chosen now; delivery happens on a spawned task.
    /// `predicate` runs under the membership lock and must not call back into
    /// the session.
    pub fn broadcast<F>(&self, message: impl Into<String>, mut predicate: F) -> JoinHandle<()>
    where
        F: FnMut(&EventMembership) -> bool,
    {
        let recipients: Vec<Arc<dyn Participant>> = self
            .lock_roster()
            .members
            .values()
            .filter(|membership| predicate(membership))
            .map(|membership| Arc::clone(membership.participant()))
            .collect();
        let message = message.into();

        tokio::spawn(async move {
            for recipient in recipients {
                recipient.send_message(&message);
            }
        })
    }

    pub fn broadcast_all(&self, message: impl Into<String>) -> JoinHandle<()> {
        self.broadcast(message, |_| true)
    }

    /// Move every member to the shared event location. Returns how many were
    /// moved; zero if no location is configured.
    pub fn teleport_all_members(&self) -> usize {
        let Some(location) = self.shared_location.borrow().clone() else {
            return 0;
        };

        let members = self.members();
        for membership in &members {
            membership.teleport_to(&location);
        }
        members.len()
    }

    /// Spread the members over `teams` from a random starting team.
    pub fn assign_teams(&self, teams: &BTreeMap<String, Location>) -> Result<Vec<TeamRoster>> {
        if teams.is_empty() {
            return Err(EventError::NoTeams);
        }
        let start = rand::thread_rng().gen_range(0..teams.len());
        self.assign_teams_from(teams, start)
    }

    /// Spread the members over `teams`, starting at the `start`-th team in
    /// name order. Each member is moved to their team and told its name.
    pub fn assign_teams_from(
        &self,
        teams: &BTreeMap<String, Location>,
        start: usize,
    ) -> Result<Vec<TeamRoster>> {
        if teams.is_empty() {
            return Err(EventError::NoTeams);
        }
        if !self.is_active() {
            return Err(EventError::SessionEnded(self.id));
        }

        let buckets = assign_round_robin(teams.len(), self.members(), start);
        let mut rosters = Vec::with_capacity(teams.len());

        for ((team, location), members) in teams.iter().zip(buckets) {
            let notice = self.messages.render(MessageId::JoinTeam, &[team]);
            for membership in &members {
                membership.teleport_to(location);
                membership.participant().send_message(&notice);
            }

            rosters.push(TeamRoster {
                team: team.clone(),
                location: location.clone(),
                members: members.iter().map(EventMembership::player).collect(),
            });
        }

        info!(
            "Assigned {} players of session {} to {} teams",
            rosters.iter().map(|r| r.members.len()).sum::<usize>(),
            self.id,
            rosters.len()
        );
        Ok(rosters)
    }

    /// End the session: send everyone back, unregister the respawn hook and
    /// clear the ledger. Returns how many members were flushed.
    ///
    /// Only the owning coordinator may end a session, and only once.
    pub async fn end_event(&self, caller: CoordinatorId) -> Result<usize> {
        if caller != self.owner {
            error!(
                "Coordinator {} tried to end session {} owned by {}",
                caller, self.id, self.owner
            );
            return Err(EventError::ArgumentMismatch {
                session: self.id,
                expected: self.owner,
                provided: caller,
            });
        }

        let flushed: Vec<EventMembership> = {
            let mut roster = self.lock_roster();
            if roster.state == SessionState::Ended {
                return Err(EventError::SessionEnded(self.id));
            }
            roster.state = SessionState::Ended;
            roster.members.drain(..).map(|(_, membership)| membership).collect()
        };

        let notice = self.messages.get(MessageId::LeaveForceEnd);
        let returns: Vec<_> = flushed
            .iter()
            .map(|membership| (membership, membership.teleport_back()))
            .collect();
        for (membership, returned) in returns {
            returned.await;
            membership.participant().send_message(&notice);
        }

        self.unregister_respawn_hook();
        let cleared = self.ledger.clear_all().await;
        info!(
            "Event session {} ended; {} players returned, {} records cleared",
            self.id,
            flushed.len(),
            cleared
        );

        Ok(flushed.len())
    }

    /// Where `player` should respawn while the session is active.
    pub fn respawn_location(&self, player: PlayerId) -> Option<Location> {
        {
            let roster = self.lock_roster();
            if roster.state != SessionState::Active || !roster.members.contains_key(&player) {
                return None;
            }
        }
        self.shared_location.borrow().clone()
    }

    fn unregister_respawn_hook(&self) {
        let hook_id = self
            .respawn_hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(hook_id) = hook_id {
            self.hooks.unregister(hook_id);
        }
    }

    fn lock_roster(&self) -> MutexGuard<'_, Roster> {
        self.roster.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for EventSession {
    fn drop(&mut self) {
        self.unregister_respawn_hook();
    }
}

impl std::fmt::Debug for EventSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let roster = self.lock_roster();
        f.debug_struct("EventSession")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("state", &roster.state)
            .field("members", &roster.members.len())
            .finish()
    }
}

/// Redirects member respawns to the shared event location.
struct SessionRespawnHook {
    session: Weak<EventSession>,
}

impl RespawnHook for SessionRespawnHook {
    fn name(&self) -> &'static str {
        "event-session"
    }

    fn on_respawn(&self, request: &mut RespawnRequest) {
        let Some(session) = self.session.upgrade() else {
            return;
        };
        if let Some(location) = session.respawn_location(request.player()) {
            request.set_location(location);
        }
    }
}
