//! Frame lifecycle: building, attaching and detaching an entry's frame.
//!
//! Frames are built once per entry and never destroyed. Attaching inserts the
//! frame into the visual tree and opens a fresh messaging channel; detaching
//! clears the source and connection state but keeps the resource for reuse.

use std::rc::Rc;

use story_player_core::entry::EntryDescriptor;
use story_player_core::error::PlayerError;
use story_player_core::signal::Deferred;
use story_player_core::surface::{Frame, LoadState, PlayerSurface};
use tokio::task::JoinHandle;
use tracing::{debug, error};
use uuid::Uuid;

use super::messaging::MessagingChannel;
use super::player::PlayerCore;
use crate::domain::entry::EntryView;

/// Sandbox capabilities every story frame must be granted.
pub const REQUIRED_CAPABILITIES: [&str; 1] = ["allow-top-navigation"];

/// One story tracked by the player. Entries live in an arena indexed by
/// `index`; all cross-references are by index.
pub(crate) struct Entry {
    pub(crate) descriptor: EntryDescriptor,
    pub(crate) index: usize,
    pub(crate) distance: usize,
    pub(crate) frame: Option<Box<dyn Frame>>,
    pub(crate) content_loaded: bool,
    pub(crate) connected: Deferred<()>,
    pub(crate) channel: Deferred<Rc<MessagingChannel>>,
    /// Identifies the current attach cycle; `None` while detached.
    pub(crate) cycle: Option<Uuid>,
    /// Inbound message pump of the current cycle's channel.
    pub(crate) pump: Option<JoinHandle<()>>,
}

impl Entry {
    pub(crate) fn new(descriptor: EntryDescriptor, index: usize, active: usize) -> Self {
        Self {
            descriptor,
            index,
            distance: index.abs_diff(active),
            frame: None,
            content_loaded: false,
            connected: Deferred::new(),
            channel: Deferred::new(),
            cycle: None,
            pump: None,
        }
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.frame.as_ref().is_some_and(|f| f.is_attached())
    }

    pub(crate) fn view(&self) -> EntryView {
        EntryView {
            index: self.index,
            locator: self.descriptor.locator.clone(),
            title: self.descriptor.title.clone(),
            poster_image: self.descriptor.poster_image.clone(),
            distance: self.distance,
            has_frame: self.frame.is_some(),
            attached: self.is_attached(),
            content_loaded: self.content_loaded,
        }
    }
}

/// Builds the frame resource for a story.
///
/// # Errors
///
/// Returns `PlayerError::UnsupportedCapability` if the environment can verify
/// capability support and a required capability is unsupported.
pub(crate) fn build_frame(
    surface: &dyn PlayerSurface,
    descriptor: &EntryDescriptor,
) -> Result<Box<dyn Frame>, PlayerError> {
    let mut frame = surface.create_frame(descriptor);
    if let Some(poster) = &descriptor.poster_image {
        frame.set_poster(poster);
    }
    apply_capabilities(frame.as_mut())?;
    surface.set_load_state(LoadState::Loading);
    Ok(frame)
}

fn apply_capabilities(frame: &mut dyn Frame) -> Result<(), PlayerError> {
    for capability in REQUIRED_CAPABILITIES {
        match frame.supports_capability(capability) {
            // Support cannot be verified here; proceed without the flags.
            None => return Ok(()),
            Some(false) => {
                return Err(PlayerError::UnsupportedCapability(capability.to_owned()));
            }
            Some(true) => frame.add_capability(capability),
        }
    }
    Ok(())
}

impl PlayerCore {
    /// Builds and stores the frame for the entry at `index`. A build failure
    /// leaves that entry without a frame and is logged.
    pub(crate) fn materialize(&self, entry: &mut Entry) {
        match build_frame(self.collab.surface.as_ref(), &entry.descriptor) {
            Ok(frame) => entry.frame = Some(frame),
            Err(err) => {
                error!(index = entry.index, error = %err, "failed to build story frame");
            }
        }
    }

    /// Inserts the entry's frame into the visual tree and starts a new
    /// messaging cycle.
    pub(crate) fn attach(self: &Rc<Self>, entry: &mut Entry) {
        let Some(frame) = entry.frame.as_mut() else {
            return;
        };
        frame.attach();

        let cycle = Uuid::new_v4();
        entry.cycle = Some(cycle);
        debug!(index = entry.index, channel_id = %cycle, "attached story frame");

        tokio::task::spawn_local(Rc::clone(self).connect(
            entry.index,
            cycle,
            entry.descriptor.locator.clone(),
        ));

        entry.connected.resolve(());
    }

    /// Removes the entry's frame from the visual tree and tears down its
    /// messaging channel. The frame resource persists.
    pub(crate) fn detach(entry: &mut Entry) {
        if let Some(pump) = entry.pump.take() {
            pump.abort();
        }
        entry.content_loaded = false;
        entry.connected = Deferred::new();
        entry.channel = Deferred::new();
        entry.cycle = None;
        if let Some(frame) = entry.frame.as_mut() {
            frame.set_src("");
            frame.detach();
        }
        debug!(index = entry.index, "detached story frame");
    }
}
