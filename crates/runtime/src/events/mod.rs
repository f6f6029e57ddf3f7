//! Topic-based event bus for coordinator lifecycle events.
//!
//! Events are published to specific topics, and consumers can subscribe only
//! to the topics they need.

mod bus;
mod types;

pub use bus::{Envelope, Event, EventBus, Topic};
pub use types::{ConfigEvent, SessionEvent};
