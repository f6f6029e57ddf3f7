//! The server-wide event coordinator.
//!
//! [`EventCoordinator`] is a cloneable handle; every mutation is sent to a
//! single worker task that owns the current session, mode, shared location
//! and team directory. Mutations therefore never interleave: a mode switch
//! that ends the running event cannot race a concurrent start.

mod worker;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use event_content::{EventConfig, MessageCatalog, ModeRegistry};
use event_core::{Location, Mode};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{EventError, Participant, Result};
use crate::events::{Envelope, EventBus, Topic};
use crate::hooks::HookRegistry;
use crate::items::ItemCatalog;
use crate::ledger::PlayerLedger;
use crate::session::{EventMembership, EventSession, TeamRoster};
use crate::store::{PendingSave, Store};
use crate::teams::TeamDirectory;

use worker::{Command, CoordinatorWorker, WorkerParts};

/// Name of the coordinator document under the store root.
pub const EVENT_DATA_DOCUMENT: &str = "event-data.json";

/// Identity of one coordinator instance; sessions only accept end requests
/// from the coordinator that created them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CoordinatorId(Uuid);

impl CoordinatorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CoordinatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CoordinatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub command_buffer_size: usize,
    pub event_bus_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            command_buffer_size: 32,
            event_bus_capacity: 64,
        }
    }
}

/// Where a joining player was sent.
#[derive(Clone, Debug, PartialEq)]
pub enum Placement {
    /// The mode has no spawn point configured yet.
    Unplaced,
    SharedLocation(Location),
    Team { team: String, location: Location },
}

#[derive(Clone, Debug)]
pub struct JoinOutcome {
    pub membership: EventMembership,
    pub placement: Placement,
    pub items_given: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TeleportOutcome {
    pub teleported: usize,
    /// Empty unless the mode spawns by team.
    pub rosters: Vec<TeamRoster>,
    pub items_given: usize,
}

/// Client-facing handle to the coordinator worker.
#[derive(Clone)]
pub struct EventCoordinator {
    id: CoordinatorId,
    command_tx: mpsc::Sender<Command>,
    modes: Arc<ModeRegistry>,
    items: Arc<ItemCatalog>,
    messages: Arc<MessageCatalog>,
    location: watch::Receiver<Option<Location>>,
    event_bus: EventBus,
    hooks: HookRegistry,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl EventCoordinator {
    pub fn builder(store: Store) -> EventCoordinatorBuilder {
        EventCoordinatorBuilder::new(store)
    }

    /// Start a coordinator over `store` with default settings.
    pub async fn start(store: Store, event_config: EventConfig) -> Result<Self> {
        Self::builder(store).event_config(event_config).build().await
    }

    pub fn id(&self) -> CoordinatorId {
        self.id
    }

    /// Start a new session. Fails with [`EventError::EventAlreadyRunning`]
    /// carrying the running session if there is one.
    pub async fn start_event(&self) -> Result<Arc<EventSession>> {
        self.request(|reply| Command::StartEvent { reply }).await?
    }

    /// End the running session. `false` if none was running.
    pub async fn end_event(&self) -> Result<bool> {
        self.request(|reply| Command::EndEvent { reply }).await?
    }

    /// End the running session, if any, and start a new one.
    pub async fn restart_event(&self) -> Result<Arc<EventSession>> {
        self.request(|reply| Command::RestartEvent { reply }).await?
    }

    /// Switch to the mode called `name`, ending the running session first.
    ///
    /// Returns whether a session was ended; `false` without change when the
    /// mode is already active.
    pub async fn set_event_mode(&self, name: impl Into<String>) -> Result<bool> {
        let name = name.into();
        self.request(|reply| Command::SetEventMode { name, reply })
            .await?
    }

    /// Set or clear the shared event location. The returned save may be
    /// awaited or dropped.
    pub async fn set_event_location(&self, location: Option<Location>) -> Result<PendingSave> {
        self.request(|reply| Command::SetEventLocation { location, reply })
            .await
    }

    pub async fn set_team_location(
        &self,
        team: impl Into<String>,
        location: Option<Location>,
    ) -> Result<PendingSave> {
        let team = team.into();
        self.request(|reply| Command::SetTeamLocation {
            team,
            location,
            reply,
        })
        .await?
    }

    /// Add `participant` to the running event and place them as the mode says.
    pub async fn join(&self, participant: Arc<dyn Participant>) -> Result<JoinOutcome> {
        self.request(|reply| Command::Join { participant, reply })
            .await?
    }

    pub async fn leave(&self, participant: Arc<dyn Participant>) -> Result<()> {
        self.request(|reply| Command::Leave { participant, reply })
            .await?
    }

    /// Move every member to the event: to the shared location, or spread
    /// over the teams, then hand out the mode's reward items.
    pub async fn teleport_event(&self) -> Result<TeleportOutcome> {
        self.request(|reply| Command::TeleportEvent { reply })
            .await?
    }

    /// The running session, if any.
    pub async fn current_session(&self) -> Result<Option<Arc<EventSession>>> {
        self.request(|reply| Command::CurrentSession { reply }).await
    }

    pub async fn current_mode(&self) -> Result<Mode> {
        self.request(|reply| Command::CurrentMode { reply }).await
    }

    pub async fn team_locations(&self) -> Result<Option<BTreeMap<String, Location>>> {
        self.request(|reply| Command::TeamLocations { reply }).await
    }

    /// Shared event location as last committed.
    pub fn event_location(&self) -> Option<Location> {
        self.location.borrow().clone()
    }

    pub fn modes(&self) -> &ModeRegistry {
        &self.modes
    }

    pub fn event_items(&self) -> &ItemCatalog {
        &self.items
    }

    pub fn messages(&self) -> &MessageCatalog {
        &self.messages
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Subscribe to events from a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Envelope> {
        self.event_bus.subscribe(topic)
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Clear the player ledger and stop the worker.
    ///
    /// The running session is not ended and team or location settings are
    /// kept. Returns the number of player records removed.
    pub async fn shutdown(&self) -> Result<usize> {
        let cleared = self.request(|reply| Command::Shutdown { reply }).await?;

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!("Event coordinator worker did not stop cleanly: {}", e);
            }
        }

        Ok(cleared)
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| EventError::CommandChannelClosed)?;

        reply_rx.await.map_err(EventError::ReplyChannelClosed)
    }
}

impl fmt::Debug for EventCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCoordinator")
            .field("id", &self.id)
            .field("modes", &self.modes.len())
            .field("items", &self.items.len())
            .finish()
    }
}

/// Builder for [`EventCoordinator`].
pub struct EventCoordinatorBuilder {
    store: Store,
    config: CoordinatorConfig,
    event_config: EventConfig,
    hooks: Option<HookRegistry>,
}

impl EventCoordinatorBuilder {
    fn new(store: Store) -> Self {
        Self {
            store,
            config: CoordinatorConfig::default(),
            event_config: EventConfig::default(),
            hooks: None,
        }
    }

    /// Override coordinator configuration
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Modes and messages to run with.
    pub fn event_config(mut self, event_config: EventConfig) -> Self {
        self.event_config = event_config;
        self
    }

    /// Share an existing hook registry with the host.
    pub fn hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Load persisted state and spawn the worker.
    ///
    /// Fails with [`EventError::NoModes`] when the configuration defines no
    /// usable mode.
    pub async fn build(self) -> Result<EventCoordinator> {
        let modes = ModeRegistry::from_config(&self.event_config);
        let messages = MessageCatalog::from_config(&self.event_config);

        let document = self.store.document(EVENT_DATA_DOCUMENT);
        let (status, location, last_mode) = document
            .read(|data| {
                (
                    data.get_str(worker::STATUS_KEY).map(str::to_string),
                    data.get_as::<Location>(worker::LOCATION_KEY),
                    data.get_str(worker::LAST_MODE_KEY).map(str::to_string),
                )
            })
            .await?;

        let teams = TeamDirectory::load(document.clone()).await?;
        let mode = modes
            .resolve_active(last_mode.as_deref(), self.event_config.default_mode.as_deref())
            .cloned()
            .ok_or(EventError::NoModes)?;
        let items = ItemCatalog::load(&self.store, modes.reward_item_keys()).await?;

        let id = CoordinatorId::new();
        let hooks = self.hooks.unwrap_or_default();
        let event_bus = EventBus::with_capacity(self.config.event_bus_capacity);
        let (location_tx, location_rx) = watch::channel(location);
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size.max(1));

        let modes = Arc::new(modes);
        let items = Arc::new(items);
        let messages = Arc::new(messages);

        let parts = WorkerParts {
            id,
            document,
            ledger: PlayerLedger::new(self.store.clone()),
            modes: Arc::clone(&modes),
            items: Arc::clone(&items),
            messages: Arc::clone(&messages),
            hooks: hooks.clone(),
            event_bus: event_bus.clone(),
        };
        let mut worker = CoordinatorWorker::new(parts, location_tx, teams, mode, command_rx);

        if status.as_deref() == Some(worker::STATUS_ACTIVE) {
            worker.resume()?;
        }

        let handle = tokio::spawn(worker.run());
        info!("Event coordinator {} started", id);

        Ok(EventCoordinator {
            id,
            command_tx,
            modes,
            items,
            messages,
            location: location_rx,
            event_bus,
            hooks,
            worker: Arc::new(Mutex::new(Some(handle))),
        })
    }
}
