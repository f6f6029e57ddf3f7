//! Capabilities the runtime needs from a player in the host world.

use event_core::{ItemSpec, Location, PlayerId};

/// A player as seen by the event runtime.
///
/// Implemented by the host. World-mutating calls are fire-and-forget: the
/// runtime never waits for a teleport or an item transfer to finish.
pub trait Participant: Send + Sync {
    fn id(&self) -> PlayerId;

    fn display_name(&self) -> String;

    /// Current position, copied out of the host.
    fn location(&self) -> Location;

    fn inventory_is_empty(&self) -> bool;

    fn teleport(&self, location: &Location);

    fn send_message(&self, message: &str);

    /// Returns `false` if the host could not build or place the item.
    fn give_item(&self, item: &ItemSpec) -> bool;
}
