#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use event_core::{ItemSpec, Location, PlayerId};
use event_runtime::Participant;

/// In-memory player that records everything the runtime does to it.
pub struct TestParticipant {
    id: PlayerId,
    name: String,
    location: Mutex<Location>,
    inventory: Mutex<Vec<ItemSpec>>,
    messages: Mutex<Vec<String>>,
    teleports: Mutex<Vec<Location>>,
}

impl TestParticipant {
    pub fn new(name: &str, location: Location) -> Arc<Self> {
        Arc::new(Self {
            id: PlayerId::new_random(),
            name: name.to_string(),
            location: Mutex::new(location),
            inventory: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            teleports: Mutex::new(Vec::new()),
        })
    }

    pub fn holding(name: &str, location: Location, item: ItemSpec) -> Arc<Self> {
        let participant = Self::new(name, location);
        participant.inventory.lock().unwrap().push(item);
        participant
    }

    pub fn current_location(&self) -> Location {
        self.location.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn teleports(&self) -> Vec<Location> {
        self.teleports.lock().unwrap().clone()
    }

    pub fn items(&self) -> Vec<ItemSpec> {
        self.inventory.lock().unwrap().clone()
    }
}

impl Participant for TestParticipant {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }

    fn location(&self) -> Location {
        self.current_location()
    }

    fn inventory_is_empty(&self) -> bool {
        self.inventory.lock().unwrap().is_empty()
    }

    fn teleport(&self, location: &Location) {
        *self.location.lock().unwrap() = location.clone();
        self.teleports.lock().unwrap().push(location.clone());
    }

    fn send_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    fn give_item(&self, item: &ItemSpec) -> bool {
        self.inventory.lock().unwrap().push(item.clone());
        true
    }
}

pub fn home() -> Location {
    Location::new("world", 100.0, 64.0, 100.0)
}

pub fn arena() -> Location {
    Location::new("world", 0.0, 80.0, 0.0).with_rotation(180.0, 0.0)
}
