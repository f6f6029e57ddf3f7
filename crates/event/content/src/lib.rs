//! Configuration-driven content for the event runtime.
//!
//! This crate turns the TOML event configuration into the immutable catalogs
//! the runtime consumes:
//! - [`ModeRegistry`]: the named event modes and their spawn/reward flags
//! - [`MessageCatalog`]: user-facing message templates keyed by [`MessageId`]
//!
//! Catalogs are built once at startup and replaced wholesale on reload.
//!
//! [`MessageId`]: event_core::MessageId

pub mod loaders;
pub mod messages;
pub mod modes;

pub use loaders::{ConfigError, ConfigLoader, EventConfig, ModeSection};
pub use messages::MessageCatalog;
pub use modes::ModeRegistry;
