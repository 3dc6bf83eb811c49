//! The player: shared state, collaborators and the public operation surface.

use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

use serde_json::Value;
use story_player_core::collaborators::Collaborators;
use story_player_core::entry::EntryDescriptor;
use story_player_core::error::PlayerError;
use story_player_core::host::{ExitControl, PlayerEvent};
use story_player_core::signal::Deferred;
use story_player_core::surface::LoadState;
use tracing::{debug, info, warn};

use super::animation::AnimationQueue;
use super::lifecycle::Entry;
use super::load::LoadCoordinator;
use super::messaging::DocumentState;
use super::render::RenderPass;
use crate::domain::config::{
    PlayerDeclaration, ResolvedConfig, parse_exit_control, resolve_serving_host,
};
use crate::domain::entry::{EntryView, normalize_title, validate_batch};
use crate::domain::gesture::{GestureMachine, SwipeState};
use crate::domain::location::{PlayerParams, VisibilityState};
use crate::domain::navigation::remaining;

/// Options for `show` and `go`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowOptions {
    /// Whether the switch uses the animated navigation transition.
    pub animate: bool,
}

impl Default for ShowOptions {
    fn default() -> Self {
        Self { animate: true }
    }
}

impl ShowOptions {
    /// Options that switch without the animated transition.
    #[must_use]
    pub fn instant() -> Self {
        Self { animate: false }
    }
}

/// Story state that can be queried with `get_story_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryStateKind {
    /// Whether a page attachment is open; answered with
    /// `PageAttachmentOpen` or `PageAttachmentClose`.
    PageAttachment,
}

/// Mutable player state. Never borrowed across an await point.
pub(crate) struct PlayerState {
    pub(crate) entries: Vec<Entry>,
    pub(crate) active: usize,
    pub(crate) playing: bool,
    pub(crate) built: bool,
    pub(crate) laid_out: bool,
    pub(crate) gesture: GestureMachine,
    pub(crate) load: LoadCoordinator,
    pub(crate) animation: AnimationQueue,
    pub(crate) load_state: Option<LoadState>,
    pub(crate) ui_state: Option<Value>,
    pub(crate) suppressed_transition: Option<usize>,
    pub(crate) fetching: bool,
    declared: Vec<EntryDescriptor>,
}

/// Shared player internals. Background tasks hold an `Rc` (short-lived
/// pipelines) or a `Weak` (message pumps) to this.
pub(crate) struct PlayerCore {
    pub(crate) collab: Collaborators,
    pub(crate) config: ResolvedConfig,
    pub(crate) serving_host: Option<String>,
    pub(crate) exit_control: Option<ExitControl>,
    pub(crate) params: PlayerParams,
    pub(crate) visible: Deferred<()>,
    pub(crate) state: RefCell<PlayerState>,
    wrap_enabled: OnceCell<bool>,
    fetch_enabled: OnceCell<bool>,
}

impl PlayerCore {
    pub(crate) fn emit(&self, event: PlayerEvent) {
        debug!(event = event.name(), "dispatching player event");
        self.collab.host.dispatch(event);
    }

    pub(crate) fn wraps(&self) -> bool {
        *self.wrap_enabled.get_or_init(|| self.config.wraps())
    }

    pub(crate) fn fetch_enabled(&self) -> bool {
        *self
            .fetch_enabled
            .get_or_init(|| self.config.fetch_endpoint().is_some())
    }

    pub(crate) fn index_of(&self, locator: &str) -> Option<usize> {
        self.state
            .borrow()
            .entries
            .iter()
            .position(|e| e.descriptor.locator == locator)
    }

    /// Appends a batch of entries and builds their frames. The batch is
    /// validated before anything is mutated.
    pub(crate) fn append(
        self: &Rc<Self>,
        batch: Vec<EntryDescriptor>,
    ) -> Result<RenderPass, PlayerError> {
        if batch.is_empty() {
            return Ok(RenderPass::empty());
        }
        validate_batch(&batch)?;

        let start = {
            let mut state = self.state.borrow_mut();
            let start = state.entries.len();
            let active = state.active;
            for (offset, descriptor) in batch.into_iter().enumerate() {
                let mut entry = Entry::new(normalize(descriptor), start + offset, active);
                self.materialize(&mut entry);
                state.entries.push(entry);
            }
            start
        };
        info!(start, "appended stories");

        Ok(self.render(Some(start)))
    }

    /// Materializes declared entries, runs the initial prefetch check and
    /// signals readiness. Idempotent.
    fn build(self: &Rc<Self>) {
        let declared = {
            let mut state = self.state.borrow_mut();
            if state.built {
                return;
            }
            state.built = true;
            std::mem::take(&mut state.declared)
        };

        if self.exit_control.is_some() {
            self.collab.surface.set_exit_control_visible(true);
        }

        let len = {
            let mut state = self.state.borrow_mut();
            let active = state.active;
            for (index, descriptor) in declared.into_iter().enumerate() {
                let mut entry = Entry::new(normalize(descriptor), index, active);
                self.materialize(&mut entry);
                state.entries.push(entry);
            }
            state.entries.len()
        };

        self.maybe_prefetch(remaining(0, len));
        info!(stories = len, "story player built");
        self.emit(PlayerEvent::Ready);
    }

    fn layout(self: &Rc<Self>) -> RenderPass {
        {
            let mut state = self.state.borrow_mut();
            if state.laid_out {
                return RenderPass::empty();
            }
            state.laid_out = true;
        }
        self.render(None)
    }

    fn toggle_paused(&self, paused: bool) {
        let active = {
            let mut state = self.state.borrow_mut();
            state.playing = !paused;
            state.active
        };
        let visibility = if paused {
            VisibilityState::Paused
        } else {
            VisibilityState::Visible
        };
        self.update_visibility(active, visibility);
    }

    fn set_muted(&self, muted: bool) {
        let active = self.state.borrow().active;
        self.with_channel(active, "set muted state", move |channel| async move {
            channel
                .set_state(DocumentState::Muted, Value::Bool(muted))
                .await
        });
    }
}

fn normalize(descriptor: EntryDescriptor) -> EntryDescriptor {
    EntryDescriptor {
        title: normalize_title(descriptor.title.as_deref()),
        ..descriptor
    }
}

/// An embeddable story player.
///
/// All operations must run inside a tokio `LocalSet`: the player spawns
/// local tasks for handshakes, render pipelines and prefetches.
#[derive(Clone)]
pub struct Player {
    core: Rc<PlayerCore>,
}

impl Player {
    /// Creates an unbuilt player from its declaration. Configuration is
    /// parsed and the declared entries validated here; nothing is
    /// materialized until [`build`](Self::build) or [`load`](Self::load).
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Validation` for a malformed configuration block
    /// or a declared entry without a locator.
    pub fn new(
        declaration: PlayerDeclaration,
        collaborators: Collaborators,
    ) -> Result<Self, PlayerError> {
        let config = ResolvedConfig::parse(declaration.config.as_ref())?;
        validate_batch(&declaration.entries)?;

        let serving_host = resolve_serving_host(declaration.serving_host.as_deref());
        let exit_control = parse_exit_control(declaration.exit_control.as_deref());
        let params = PlayerParams {
            host_origin: collaborators.host_origin.clone(),
            attribution: config.attribution,
        };

        let state = PlayerState {
            entries: Vec::new(),
            active: 0,
            playing: config.autoplay.unwrap_or(true),
            built: false,
            laid_out: false,
            gesture: GestureMachine::new(),
            load: LoadCoordinator::new(),
            animation: AnimationQueue::new(),
            load_state: None,
            ui_state: None,
            suppressed_transition: None,
            fetching: false,
            declared: declaration.entries,
        };

        Ok(Self {
            core: Rc::new(PlayerCore {
                collab: collaborators,
                config,
                serving_host,
                exit_control,
                params,
                visible: Deferred::new(),
                state: RefCell::new(state),
                wrap_enabled: OnceCell::new(),
                fetch_enabled: OnceCell::new(),
            }),
        })
    }

    /// Creates and builds a player: frames are built for every declared
    /// entry and `Ready` is emitted.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn build(
        declaration: PlayerDeclaration,
        collaborators: Collaborators,
    ) -> Result<Self, PlayerError> {
        let player = Self::new(declaration, collaborators)?;
        player.core.build();
        Ok(player)
    }

    /// Builds and lays out in one call.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Validation` if the player is already built.
    pub fn load(&self) -> Result<RenderPass, PlayerError> {
        if self.core.state.borrow().built {
            return Err(PlayerError::Validation(
                "calling load() on an already loaded element".to_owned(),
            ));
        }
        self.core.build();
        Ok(self.core.layout())
    }

    /// First layout: runs the initial reconciliation pass. Idempotent.
    pub fn layout(&self) -> RenderPass {
        self.core.build();
        self.core.layout()
    }

    /// Appends stories to the end of the sequence.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::Validation` if any element lacks a locator, in
    /// which case nothing is appended.
    pub fn add(&self, batch: Vec<EntryDescriptor>) -> Result<RenderPass, PlayerError> {
        self.core.append(batch)
    }

    /// Makes the story at `locator` active (the current one when `None`) and
    /// optionally moves it to `page_id`.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NotFound` if no story matches.
    pub fn show(
        &self,
        locator: Option<&str>,
        page_id: Option<&str>,
        options: ShowOptions,
    ) -> Result<RenderPass, PlayerError> {
        self.core.show(locator, page_id, options)
    }

    /// Resumes playback of the active story, laying out first if needed.
    pub fn play(&self) {
        if !self.core.state.borrow().laid_out {
            drop(self.layout());
        }
        self.core.toggle_paused(false);
    }

    /// Pauses the active story.
    pub fn pause(&self) {
        self.core.toggle_paused(true);
    }

    /// Moves to the next story.
    pub fn next(&self) -> RenderPass {
        self.core.next()
    }

    /// Moves to the previous story.
    pub fn previous(&self) -> RenderPass {
        self.core.previous()
    }

    /// Moves by `story_delta` stories, then by `page_delta` pages within the
    /// new active story.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::OutOfRange` if the target is out of bounds and
    /// wrap is disabled.
    pub fn go(
        &self,
        story_delta: i64,
        page_delta: i64,
        options: ShowOptions,
    ) -> Result<RenderPass, PlayerError> {
        self.core.go(story_delta, page_delta, options)
    }

    /// Mutes the active story.
    pub fn mute(&self) {
        self.core.set_muted(true);
    }

    /// Unmutes the active story.
    pub fn unmute(&self) {
        self.core.set_muted(false);
    }

    /// Asks the active story for a piece of state; the answer arrives as a
    /// host event.
    pub fn get_story_state(&self, kind: StoryStateKind) {
        match kind {
            StoryStateKind::PageAttachment => self.core.query_page_attachment(),
        }
    }

    /// Rewinds the story at `locator` to its first page once it is connected.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NotFound` if no story matches.
    pub fn rewind(&self, locator: &str) -> Result<(), PlayerError> {
        self.core.rewind(locator)
    }

    /// Activates the legacy exit control, if one is configured.
    pub fn activate_exit_control(&self) {
        match self.core.exit_control {
            Some(kind) => self.core.emit(PlayerEvent::ExitControl { kind }),
            None => warn!("exit control activated but none is configured"),
        }
    }

    /// The player became visible in the host viewport.
    pub fn on_visible(&self) {
        if self.core.visible.resolve(()) {
            debug!("story player visible");
        }
    }

    /// A frame reported a successful load.
    pub fn on_frame_loaded(&self, index: usize) {
        self.core.set_load_state(index, LoadState::Loaded);
    }

    /// A frame reported a load error.
    pub fn on_frame_error(&self, index: usize) {
        self.core.set_load_state(index, LoadState::Error);
    }

    /// The navigation transition of the frame at `index` finished.
    pub fn on_transition_end(&self, index: usize) {
        let restore = {
            let mut state = self.core.state.borrow_mut();
            if state.suppressed_transition == Some(index) {
                state.suppressed_transition = None;
                true
            } else {
                false
            }
        };
        if restore {
            self.core.collab.surface.set_navigation_transition(true);
        }
    }

    /// The host viewport was resized.
    pub fn on_resize(&self) -> RenderPass {
        self.core.render(None)
    }

    /// Applies every queued frame write. Returns how many frames were
    /// written.
    pub fn animation_frame(&self) -> usize {
        self.core.flush_animation()
    }

    /// Snapshot of every entry.
    #[must_use]
    pub fn entries(&self) -> Vec<EntryView> {
        self.core.state.borrow().entries.iter().map(Entry::view).collect()
    }

    /// Index of the active story.
    #[must_use]
    pub fn active_index(&self) -> usize {
        self.core.state.borrow().active
    }

    /// Whether playback is on.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.core.state.borrow().playing
    }

    /// Whether the player has been built.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.core.state.borrow().built
    }

    /// Whether the player has been laid out.
    #[must_use]
    pub fn is_laid_out(&self) -> bool {
        self.core.state.borrow().laid_out
    }

    /// Current swipe state of the gesture machine.
    #[must_use]
    pub fn swipe_state(&self) -> SwipeState {
        self.core.state.borrow().gesture.swipe_state()
    }

    /// The container load state, once any frame was built.
    #[must_use]
    pub fn load_state(&self) -> Option<LoadState> {
        self.core.state.borrow().load_state
    }

    /// The last UI state reported by a story.
    #[must_use]
    pub fn ui_state(&self) -> Option<Value> {
        self.core.state.borrow().ui_state.clone()
    }

    /// Whether navigation wraps around the ends.
    #[must_use]
    pub fn is_wrap_enabled(&self) -> bool {
        self.core.wraps()
    }

    /// Whether more stories are fetched near the end.
    #[must_use]
    pub fn is_fetch_enabled(&self) -> bool {
        self.core.fetch_enabled()
    }
}

impl PlayerCore {
    fn set_load_state(&self, index: usize, load_state: LoadState) {
        debug!(index, state = ?load_state, "frame load state changed");
        self.state.borrow_mut().load_state = Some(load_state);
        self.collab.surface.set_load_state(load_state);
    }
}
