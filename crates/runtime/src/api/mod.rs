//! Public runtime API surface.
//!
//! Gathers the capability trait hosts implement and the error type every
//! runtime operation returns.

pub mod errors;
pub mod participant;

pub use errors::{EventError, Result};
pub use participant::Participant;
