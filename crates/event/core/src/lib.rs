//! Plain domain types shared by the event runtime and its loaders.
//!
//! `event-core` holds values only: identities, locations, mode descriptors,
//! item specs and message ids. Nothing here performs I/O or owns state, so the
//! runtime, the content loaders and host integrations can all depend on it.
pub mod item;
pub mod location;
pub mod message;
pub mod mode;
pub mod player;

pub use item::ItemSpec;
pub use location::Location;
pub use message::MessageId;
pub use mode::{Mode, SpawnKind};
pub use player::{PlayerId, SessionId};
