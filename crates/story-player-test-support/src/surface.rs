//! Test surface — a `PlayerSurface` whose frames record every write.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use story_player_core::entry::EntryDescriptor;
use story_player_core::surface::{Frame, FrameTransform, LoadState, PlayerSurface, StoryPosition};

#[derive(Debug, Default)]
struct FrameRecord {
    capabilities: Vec<String>,
    poster: Option<String>,
    src: String,
    src_history: Vec<String>,
    title: Option<String>,
    attached: bool,
    attach_count: usize,
    detach_count: usize,
    transforms: Vec<FrameTransform>,
    positions: Vec<StoryPosition>,
    focus_count: usize,
}

/// Read handle on one frame created by a [`RecordingSurface`].
#[derive(Debug, Clone)]
pub struct FrameProbe(Rc<RefCell<FrameRecord>>);

impl FrameProbe {
    /// Granted sandbox capabilities.
    #[must_use]
    pub fn capabilities(&self) -> Vec<String> {
        self.0.borrow().capabilities.clone()
    }

    /// Poster image, if set.
    #[must_use]
    pub fn poster(&self) -> Option<String> {
        self.0.borrow().poster.clone()
    }

    /// Current source.
    #[must_use]
    pub fn src(&self) -> String {
        self.0.borrow().src.clone()
    }

    /// Every source ever assigned, including clears.
    #[must_use]
    pub fn src_history(&self) -> Vec<String> {
        self.0.borrow().src_history.clone()
    }

    /// Accessible title, if set.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.0.borrow().title.clone()
    }

    /// Whether the frame is in the visual tree.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.0.borrow().attached
    }

    /// Number of attaches.
    #[must_use]
    pub fn attach_count(&self) -> usize {
        self.0.borrow().attach_count
    }

    /// Number of detaches.
    #[must_use]
    pub fn detach_count(&self) -> usize {
        self.0.borrow().detach_count
    }

    /// Last transform applied.
    #[must_use]
    pub fn transform(&self) -> Option<FrameTransform> {
        self.0.borrow().transforms.last().copied()
    }

    /// Last position marker applied.
    #[must_use]
    pub fn position(&self) -> Option<StoryPosition> {
        self.0.borrow().positions.last().copied()
    }

    /// Number of focus requests.
    #[must_use]
    pub fn focus_count(&self) -> usize {
        self.0.borrow().focus_count
    }
}

struct MockFrame {
    record: Rc<RefCell<FrameRecord>>,
    capability_support: Option<bool>,
}

impl Frame for MockFrame {
    fn supports_capability(&self, _capability: &str) -> Option<bool> {
        self.capability_support
    }

    fn add_capability(&mut self, capability: &str) {
        self.record.borrow_mut().capabilities.push(capability.to_owned());
    }

    fn set_poster(&mut self, url: &str) {
        self.record.borrow_mut().poster = Some(url.to_owned());
    }

    fn src(&self) -> String {
        self.record.borrow().src.clone()
    }

    fn set_src(&mut self, src: &str) {
        let mut record = self.record.borrow_mut();
        record.src = src.to_owned();
        record.src_history.push(src.to_owned());
    }

    fn set_title(&mut self, title: &str) {
        self.record.borrow_mut().title = Some(title.to_owned());
    }

    fn attach(&mut self) {
        let mut record = self.record.borrow_mut();
        record.attached = true;
        record.attach_count += 1;
    }

    fn detach(&mut self) {
        let mut record = self.record.borrow_mut();
        record.attached = false;
        record.detach_count += 1;
    }

    fn is_attached(&self) -> bool {
        self.record.borrow().attached
    }

    fn set_transform(&mut self, transform: &FrameTransform) {
        self.record.borrow_mut().transforms.push(*transform);
    }

    fn set_position(&mut self, position: StoryPosition) {
        self.record.borrow_mut().positions.push(position);
    }

    fn focus(&mut self) {
        self.record.borrow_mut().focus_count += 1;
    }
}

/// A surface that records container state and hands out recording frames.
#[derive(Debug)]
pub struct RecordingSurface {
    capability_support: Option<bool>,
    unsupported: HashSet<String>,
    frames: RefCell<Vec<Rc<RefCell<FrameRecord>>>>,
    load_states: RefCell<Vec<LoadState>>,
    transitions: RefCell<Vec<bool>>,
    exit_control: RefCell<Option<bool>>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::with_capability_support(Some(true))
    }
}

impl RecordingSurface {
    /// A surface whose frames support every capability.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose frames report `support` for every capability.
    #[must_use]
    pub fn with_capability_support(support: Option<bool>) -> Self {
        Self {
            capability_support: support,
            unsupported: HashSet::new(),
            frames: RefCell::new(Vec::new()),
            load_states: RefCell::new(Vec::new()),
            transitions: RefCell::new(Vec::new()),
            exit_control: RefCell::new(None),
        }
    }

    /// Frames created for `locator` report capabilities as unsupported.
    #[must_use]
    pub fn unsupported_for(mut self, locator: &str) -> Self {
        self.unsupported.insert(locator.to_owned());
        self
    }

    /// The `n`th frame created.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n + 1` frames were created.
    #[must_use]
    pub fn frame(&self, n: usize) -> FrameProbe {
        FrameProbe(Rc::clone(&self.frames.borrow()[n]))
    }

    /// Number of frames created.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Every load state applied, in order.
    #[must_use]
    pub fn load_states(&self) -> Vec<LoadState> {
        self.load_states.borrow().clone()
    }

    /// Every navigation-transition toggle, in order.
    #[must_use]
    pub fn navigation_transitions(&self) -> Vec<bool> {
        self.transitions.borrow().clone()
    }

    /// Last exit-control visibility applied.
    #[must_use]
    pub fn exit_control_visible(&self) -> Option<bool> {
        *self.exit_control.borrow()
    }
}

impl PlayerSurface for RecordingSurface {
    fn create_frame(&self, entry: &EntryDescriptor) -> Box<dyn Frame> {
        let record = Rc::new(RefCell::new(FrameRecord::default()));
        self.frames.borrow_mut().push(Rc::clone(&record));
        let capability_support = if self.unsupported.contains(&entry.locator) {
            Some(false)
        } else {
            self.capability_support
        };
        Box::new(MockFrame {
            record,
            capability_support,
        })
    }

    fn set_load_state(&self, state: LoadState) {
        self.load_states.borrow_mut().push(state);
    }

    fn set_navigation_transition(&self, enabled: bool) {
        self.transitions.borrow_mut().push(enabled);
    }

    fn set_exit_control_visible(&self, visible: bool) {
        *self.exit_control.borrow_mut() = Some(visible);
    }
}
