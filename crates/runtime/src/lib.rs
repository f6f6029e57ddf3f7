//! Runtime for the server-wide event session.
//!
//! This crate wires the file-backed document store, the player ledger and the
//! team directory into an actor-style coordinator. Hosts embed
//! [`EventCoordinator`] to start and end events, move players in and out, and
//! subscribe to lifecycle events.
//!
//! Modules are organized by responsibility:
//! - [`coordinator`] hosts the worker task and its cloneable handle
//! - [`session`] implements membership, team assignment and the end flush
//! - [`api`] exposes the capability trait hosts implement and the error type
//! - [`events`] provides topic-based event bus for lifecycle events
//! - [`hooks`] lets sessions redirect player respawns
//! - [`store`], [`ledger`], [`teams`] and [`items`] are the persistence adapters
pub mod api;
pub mod coordinator;
pub mod events;
pub mod hooks;
pub mod items;
pub mod ledger;
pub mod session;
pub mod store;
pub mod teams;

pub use api::{EventError, Participant, Result};
pub use coordinator::{
    CoordinatorConfig, CoordinatorId, EventCoordinator, EventCoordinatorBuilder, JoinOutcome,
    Placement, TeleportOutcome,
};
pub use events::{ConfigEvent, Envelope, Event, EventBus, SessionEvent, Topic};
pub use hooks::{HookId, HookRegistry, RespawnHook, RespawnRequest};
pub use items::ItemCatalog;
pub use ledger::PlayerLedger;
pub use session::{
    EventMembership, EventSession, ReturnPoint, SessionState, TeamRoster, assign_round_robin,
};
pub use store::{Document, DocumentData, PendingSave, PersistenceError, Store};
pub use teams::TeamDirectory;
