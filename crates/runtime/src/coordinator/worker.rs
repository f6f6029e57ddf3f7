//! Coordinator worker that owns the event state.
//!
//! Receives commands from [`EventCoordinator`](super::EventCoordinator),
//! applies them one at a time and publishes lifecycle events to the EventBus.

use std::collections::BTreeMap;
use std::sync::Arc;

use event_content::{MessageCatalog, ModeRegistry};
use event_core::{Location, MessageId, Mode};
use rand::Rng;
use serde_json::json;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use super::{CoordinatorId, JoinOutcome, Placement, TeleportOutcome};
use crate::api::{EventError, Participant, Result};
use crate::events::{ConfigEvent, EventBus, SessionEvent};
use crate::hooks::HookRegistry;
use crate::items::ItemCatalog;
use crate::ledger::PlayerLedger;
use crate::session::EventSession;
use crate::store::{Document, DocumentData, PendingSave};
use crate::teams::TeamDirectory;

pub(crate) const STATUS_KEY: &str = "status";
pub(crate) const LOCATION_KEY: &str = "location";
pub(crate) const LAST_MODE_KEY: &str = "last-mode";

pub(crate) const STATUS_ACTIVE: &str = "active";
pub(crate) const STATUS_CLEARED: &str = "cleared";

/// Commands that can be sent to the coordinator worker
pub(crate) enum Command {
    StartEvent {
        reply: oneshot::Sender<Result<Arc<EventSession>>>,
    },
    EndEvent {
        reply: oneshot::Sender<Result<bool>>,
    },
    /// End the running session, if any, and start a new one.
    RestartEvent {
        reply: oneshot::Sender<Result<Arc<EventSession>>>,
    },
    SetEventMode {
        name: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    SetEventLocation {
        location: Option<Location>,
        reply: oneshot::Sender<PendingSave>,
    },
    SetTeamLocation {
        team: String,
        location: Option<Location>,
        reply: oneshot::Sender<Result<PendingSave>>,
    },
    Join {
        participant: Arc<dyn Participant>,
        reply: oneshot::Sender<Result<JoinOutcome>>,
    },
    Leave {
        participant: Arc<dyn Participant>,
        reply: oneshot::Sender<Result<()>>,
    },
    TeleportEvent {
        reply: oneshot::Sender<Result<TeleportOutcome>>,
    },
    CurrentSession {
        reply: oneshot::Sender<Option<Arc<EventSession>>>,
    },
    CurrentMode {
        reply: oneshot::Sender<Mode>,
    },
    TeamLocations {
        reply: oneshot::Sender<Option<BTreeMap<String, Location>>>,
    },
    /// Clear the ledger, flush the coordinator document and stop.
    Shutdown { reply: oneshot::Sender<usize> },
}

/// State shared with the handle and fixed for the worker's lifetime.
pub(crate) struct WorkerParts {
    pub(crate) id: CoordinatorId,
    pub(crate) document: Document,
    pub(crate) ledger: PlayerLedger,
    pub(crate) modes: Arc<ModeRegistry>,
    pub(crate) items: Arc<ItemCatalog>,
    pub(crate) messages: Arc<MessageCatalog>,
    pub(crate) hooks: HookRegistry,
    pub(crate) event_bus: EventBus,
}

/// Background task that serializes every coordinator mutation.
pub(crate) struct CoordinatorWorker {
    parts: WorkerParts,
    location: watch::Sender<Option<Location>>,
    teams: TeamDirectory,
    mode: Mode,
    session: Option<Arc<EventSession>>,
    command_rx: mpsc::Receiver<Command>,
}

impl CoordinatorWorker {
    pub(crate) fn new(
        parts: WorkerParts,
        location: watch::Sender<Option<Location>>,
        teams: TeamDirectory,
        mode: Mode,
        command_rx: mpsc::Receiver<Command>,
    ) -> Self {
        info!(
            "Event coordinator {} initialized with mode {} and {} teams",
            parts.id,
            mode.name,
            teams.len()
        );

        Self {
            parts,
            location,
            teams,
            mode,
            session: None,
            command_rx,
        }
    }

    /// Start a fresh session because the last run shut down mid-event.
    /// Former members are not restored.
    pub(crate) fn resume(&mut self) -> Result<Arc<EventSession>> {
        let session = self.start_event()?;
        info!("Resumed interrupted event as session {}", session.id());
        Ok(session)
    }

    /// Main worker loop.
    pub(crate) async fn run(mut self) {
        while let Some(cmd) = self.command_rx.recv().await {
            if !self.handle_command(cmd).await {
                break;
            }
        }
        debug!("Event coordinator {} stopped", self.parts.id);
    }

    /// Returns `false` once the worker should stop.
    async fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::StartEvent { reply } => {
                let result = self.start_event();
                if reply.send(result).is_err() {
                    debug!("StartEvent reply channel closed (caller dropped)");
                }
            }
            Command::EndEvent { reply } => {
                let result = self.end_current().await;
                if reply.send(result).is_err() {
                    debug!("EndEvent reply channel closed (caller dropped)");
                }
            }
            Command::RestartEvent { reply } => {
                let result = self.restart_event().await;
                if reply.send(result).is_err() {
                    debug!("RestartEvent reply channel closed (caller dropped)");
                }
            }
            Command::SetEventMode { name, reply } => {
                let result = self.set_event_mode(name).await;
                if reply.send(result).is_err() {
                    debug!("SetEventMode reply channel closed (caller dropped)");
                }
            }
            Command::SetEventLocation { location, reply } => {
                let pending = self.set_event_location(location);
                if reply.send(pending).is_err() {
                    debug!("SetEventLocation reply channel closed (caller dropped)");
                }
            }
            Command::SetTeamLocation {
                team,
                location,
                reply,
            } => {
                let result = self.set_team_location(team, location);
                if reply.send(result).is_err() {
                    debug!("SetTeamLocation reply channel closed (caller dropped)");
                }
            }
            Command::Join { participant, reply } => {
                let result = self.join(participant);
                if reply.send(result).is_err() {
                    debug!("Join reply channel closed (caller dropped)");
                }
            }
            Command::Leave { participant, reply } => {
                let result = self.leave(participant).await;
                if reply.send(result).is_err() {
                    debug!("Leave reply channel closed (caller dropped)");
                }
            }
            Command::TeleportEvent { reply } => {
                let result = self.teleport_event();
                if reply.send(result).is_err() {
                    debug!("TeleportEvent reply channel closed (caller dropped)");
                }
            }
            Command::CurrentSession { reply } => {
                let _ = reply.send(self.active_session());
            }
            Command::CurrentMode { reply } => {
                let _ = reply.send(self.mode.clone());
            }
            Command::TeamLocations { reply } => {
                let _ = reply.send(self.teams.locations());
            }
            Command::Shutdown { reply } => {
                let cleared = self.shutdown().await;
                let _ = reply.send(cleared);
                return false;
            }
        }
        true
    }

    fn active_session(&self) -> Option<Arc<EventSession>> {
        self.session
            .as_ref()
            .filter(|session| session.is_active())
            .cloned()
    }

    fn start_event(&mut self) -> Result<Arc<EventSession>> {
        if let Some(existing) = self.active_session() {
            return Err(EventError::EventAlreadyRunning(existing));
        }

        let session = EventSession::new(
            self.parts.id,
            self.parts.ledger.clone(),
            Arc::clone(&self.parts.messages),
            self.location.subscribe(),
            self.parts.hooks.clone(),
        );
        self.session = Some(Arc::clone(&session));
        self.persist_status(STATUS_ACTIVE);

        self.parts.event_bus.publish(SessionEvent::Started {
            session: session.id(),
        });
        info!("Event {} started in mode {}", session.id(), self.mode.name);

        Ok(session)
    }

    /// End the current session. `false` if there was none.
    async fn end_current(&mut self) -> Result<bool> {
        let Some(session) = self.session.take() else {
            return Ok(false);
        };

        match session.end_event(self.parts.id).await {
            Ok(members) => {
                self.persist_status(STATUS_CLEARED);
                self.parts.event_bus.publish(SessionEvent::Ended {
                    session: session.id(),
                    members,
                });
                Ok(true)
            }
            Err(EventError::SessionEnded(id)) => {
                self.persist_status(STATUS_CLEARED);
                debug!("Session {} had already ended", id);
                Ok(false)
            }
            Err(e) => {
                // Keep the reference so the owner can retry.
                self.session = Some(session);
                Err(e)
            }
        }
    }

    async fn restart_event(&mut self) -> Result<Arc<EventSession>> {
        if self.end_current().await? {
            debug!("Forced restart ended the running event");
        }
        self.start_event()
    }

    async fn set_event_mode(&mut self, name: String) -> Result<bool> {
        let Some(mode) = self.parts.modes.get(&name).cloned() else {
            return Err(EventError::InvalidMode(name));
        };
        if mode.name == self.mode.name {
            return Ok(false);
        }

        let ended = self.end_current().await?;

        let previous = std::mem::replace(&mut self.mode, mode);
        let to = self.mode.name.clone();
        let committed = to.clone();
        PendingSave::spawn(
            self.parts
                .document
                .update_and_save(move |data| data.set_value(LAST_MODE_KEY, json!(committed))),
        );

        info!("Event mode changed from {} to {}", previous.name, to);
        self.parts.event_bus.publish(ConfigEvent::ModeChanged {
            from: previous.name,
            to,
        });

        Ok(ended)
    }

    fn set_event_location(&mut self, location: Option<Location>) -> PendingSave {
        self.location.send_replace(location.clone());

        let stored = location.clone();
        let pending = PendingSave::spawn(self.parts.document.try_update_and_save(
            move |data: &mut DocumentData| match &stored {
                Some(location) => data.set(LOCATION_KEY, location),
                None => {
                    data.remove(LOCATION_KEY);
                    Ok(())
                }
            },
        ));

        self.parts
            .event_bus
            .publish(ConfigEvent::LocationChanged { location });
        pending
    }

    fn set_team_location(&mut self, team: String, location: Option<Location>) -> Result<PendingSave> {
        let pending = self.teams.set_location(&team, location.clone())?;
        self.parts
            .event_bus
            .publish(ConfigEvent::TeamLocationChanged { team, location });
        Ok(pending)
    }

    fn join(&self, participant: Arc<dyn Participant>) -> Result<JoinOutcome> {
        let session = self.active_session().ok_or(EventError::NoEvent)?;
        let membership = session.add_player(Arc::clone(&participant))?;
        let messages = &self.parts.messages;

        let mut placement = Placement::Unplaced;
        if self.mode.uses_shared_location {
            let shared = self.location.borrow().clone();
            if let Some(location) = shared {
                membership.teleport_to(&location);
                placement = Placement::SharedLocation(location);
            }
        } else if self.mode.uses_team_locations {
            if let Some(names) = self.teams.teams() {
                let index = rand::thread_rng().gen_range(0..names.len());
                let picked = names
                    .into_iter()
                    .nth(index)
                    .and_then(|team| self.teams.get(&team).map(|location| (team, location)));
                if let Some((team, location)) = picked {
                    membership.teleport_to(&location);
                    participant.send_message(&messages.render(MessageId::JoinTeam, &[&team]));
                    placement = Placement::Team { team, location };
                }
            }
        }

        let items_given = self
            .parts
            .items
            .resolve(&self.mode)
            .iter()
            .filter(|item| participant.give_item(item))
            .count();

        let player = participant.id();
        participant.send_message(&messages.get(MessageId::JoinSelf));
        let announce = messages.render(MessageId::JoinAnnounce, &[&participant.display_name()]);
        session.broadcast(announce, |member| member.player() != player);

        self.parts.event_bus.publish(SessionEvent::PlayerJoined {
            session: session.id(),
            player,
        });

        Ok(JoinOutcome {
            membership,
            placement,
            items_given,
        })
    }

    async fn leave(&self, participant: Arc<dyn Participant>) -> Result<()> {
        let session = self.active_session().ok_or(EventError::NoEvent)?;
        let player = participant.id();
        session.remove_player(player).await?;

        let messages = &self.parts.messages;
        participant.send_message(&messages.get(MessageId::LeaveSelf));
        let announce = messages.render(MessageId::LeaveAnnounce, &[&participant.display_name()]);
        session.broadcast(announce, |member| member.player() != player);

        self.parts.event_bus.publish(SessionEvent::PlayerLeft {
            session: session.id(),
            player,
        });
        Ok(())
    }

    fn teleport_event(&self) -> Result<TeleportOutcome> {
        let session = self.active_session().ok_or(EventError::NoEvent)?;

        let mut outcome = TeleportOutcome::default();
        if self.mode.uses_shared_location {
            outcome.teleported = session.teleport_all_members();
        } else if self.mode.uses_team_locations {
            let teams = self.teams.locations().ok_or(EventError::NoTeams)?;
            let rosters = session.assign_teams(&teams)?;
            outcome.teleported = rosters.iter().map(|roster| roster.members.len()).sum();
            outcome.rosters = rosters;
        }

        let items = self.parts.items.resolve(&self.mode);
        if !items.is_empty() {
            for membership in session.members() {
                for item in &items {
                    if membership.participant().give_item(item) {
                        outcome.items_given += 1;
                    } else {
                        warn!("Could not give {} to {}", item.kind, membership.player());
                    }
                }
            }
        }

        Ok(outcome)
    }

    fn persist_status(&self, status: &'static str) {
        PendingSave::spawn(
            self.parts
                .document
                .update_and_save(move |data| data.set_value(STATUS_KEY, json!(status))),
        );
    }

    async fn shutdown(&mut self) -> usize {
        let cleared = self.parts.ledger.clear_all().await;
        if let Err(e) = self.parts.document.save().await {
            warn!("Failed to flush event data on shutdown: {}", e);
        }
        info!(
            "Event coordinator {} shut down; {} player records cleared",
            self.parts.id, cleared
        );
        cleared
    }
}
