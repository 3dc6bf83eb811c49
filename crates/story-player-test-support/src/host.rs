//! Test host — records every dispatched player event.

use std::cell::RefCell;

use story_player_core::host::{HostEvents, PlayerEvent};

/// A host that keeps every event it receives.
#[derive(Debug, Default)]
pub struct RecordingHost {
    events: RefCell<Vec<PlayerEvent>>,
}

impl RecordingHost {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event dispatched, in order.
    #[must_use]
    pub fn events(&self) -> Vec<PlayerEvent> {
        self.events.borrow().clone()
    }

    /// Names of every event dispatched, in order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .map(|e| e.name().to_owned())
            .collect()
    }

    /// Number of events dispatched under `name`.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl HostEvents for RecordingHost {
    fn dispatch(&self, event: PlayerEvent) {
        self.events.borrow_mut().push(event);
    }
}
