//! Touch gesture state machine.
//!
//! Classifies a touch sequence into a horizontal (navigational) swipe or a
//! vertical scroll on the first move, then tracks the live horizontal drag.
//! The machine only decides; the player applies transforms and navigation.

use serde::Deserialize;

/// Horizontal distance a swipe must exceed to change stories.
pub const TOGGLE_THRESHOLD_PX: f64 = 50.0;

/// One touch point as reported by a story document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TouchPoint {
    /// Screen-space x.
    pub screen_x: f64,
    /// Screen-space y.
    pub screen_y: f64,
    /// Viewport-space x.
    pub client_x: f64,
    /// Viewport-space y.
    pub client_y: f64,
}

/// A touch lifecycle event forwarded by a story document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TouchEvent {
    /// Event timestamp in milliseconds.
    pub time_stamp: f64,
    /// Active touches; the first one drives the gesture.
    pub touches: Vec<TouchPoint>,
}

impl TouchEvent {
    /// The primary touch, if any.
    #[must_use]
    pub fn primary(&self) -> Option<TouchPoint> {
        self.touches.first().copied()
    }
}

/// Swipe direction of an in-progress horizontal drag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SwipeState {
    /// No horizontal drag is in progress.
    #[default]
    NotSwiping,
    /// Dragging toward the left, revealing the next story.
    SwipingLeft,
    /// Dragging toward the right, revealing the previous story.
    SwipingRight,
}

/// Axis decision for the current touch sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AxisLock {
    /// No move seen yet.
    #[default]
    Undecided,
    /// Navigational swipe.
    Horizontal,
    /// Page scroll.
    Vertical,
}

impl AxisLock {
    /// The `isNavigationalSwipe` tri-state reported to the host.
    #[must_use]
    pub fn as_navigational(self) -> Option<bool> {
        match self {
            Self::Undecided => None,
            Self::Horizontal => Some(true),
            Self::Vertical => Some(false),
        }
    }
}

/// Coordinates accumulated over one touch sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TouchAccumulator {
    start_x: f64,
    start_y: f64,
    last_x: f64,
    axis: AxisLock,
}

/// What the player should do after a move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Forward the move to the page scroller.
    Scroll {
        /// Viewport-space y of the primary touch.
        client_y: f64,
    },
    /// The sequence just locked vertical; nothing else happens on this move.
    LockedVertical,
    /// Apply a live drag of `delta_x` in direction `swipe`.
    Drag {
        /// Horizontal displacement since the start.
        delta_x: f64,
        /// Direction derived from the displacement sign.
        swipe: SwipeState,
    },
    /// Horizontal, but there is nothing to swipe to.
    Ignored,
}

/// What the player should do when the sequence ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EndOutcome {
    /// A horizontal sequence ended.
    Swipe {
        /// Total horizontal displacement.
        delta_x: f64,
        /// Swipe direction at release.
        swipe: SwipeState,
    },
    /// Forward end timing to the page scroller.
    Scroll,
}

/// Final decision for a released horizontal swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDecision {
    /// Commit to the next story.
    Next,
    /// Commit to the previous story.
    Previous,
    /// Snap the dragged frames back.
    Reset,
    /// No drag was applied.
    Nothing,
}

/// The gesture state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureMachine {
    swipe: SwipeState,
    touch: TouchAccumulator,
}

impl GestureMachine {
    /// Creates an idle machine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current swipe state.
    #[must_use]
    pub fn swipe_state(&self) -> SwipeState {
        self.swipe
    }

    /// Current axis lock.
    #[must_use]
    pub fn axis(&self) -> AxisLock {
        self.touch.axis
    }

    /// Records the start of a touch sequence.
    pub fn start(&mut self, point: TouchPoint) {
        self.touch.start_x = point.screen_x;
        self.touch.start_y = point.screen_y;
    }

    /// Advances the machine on a move. `can_swipe` is false when there is
    /// only one story, in which case horizontal moves are ignored.
    pub fn on_move(&mut self, point: TouchPoint, can_swipe: bool) -> MoveOutcome {
        if self.touch.axis == AxisLock::Vertical {
            return MoveOutcome::Scroll {
                client_y: point.client_y,
            };
        }

        self.touch.last_x = point.screen_x;

        if self.touch.axis == AxisLock::Undecided {
            let dx = (self.touch.start_x - point.screen_x).abs();
            let dy = (self.touch.start_y - point.screen_y).abs();
            if dx > dy {
                self.touch.axis = AxisLock::Horizontal;
            } else {
                self.touch.axis = AxisLock::Vertical;
                return MoveOutcome::LockedVertical;
            }
        }

        if !can_swipe {
            return MoveOutcome::Ignored;
        }

        let delta_x = point.screen_x - self.touch.start_x;
        self.swipe = if delta_x < 0.0 {
            SwipeState::SwipingLeft
        } else {
            SwipeState::SwipingRight
        };

        MoveOutcome::Drag {
            delta_x,
            swipe: self.swipe,
        }
    }

    /// Ends the sequence. All accumulated state is reset regardless of the
    /// outcome.
    pub fn end(&mut self) -> EndOutcome {
        let outcome = if self.touch.axis == AxisLock::Horizontal {
            EndOutcome::Swipe {
                delta_x: self.touch.last_x - self.touch.start_x,
                swipe: self.swipe,
            }
        } else {
            EndOutcome::Scroll
        };

        self.touch = TouchAccumulator::default();
        self.swipe = SwipeState::NotSwiping;
        outcome
    }
}

/// Decides whether a released swipe commits. `has_neighbor` reports whether
/// a story exists on the swipe side.
#[must_use]
pub fn decide_swipe(
    delta_x: f64,
    swipe: SwipeState,
    has_neighbor: bool,
    wraps: bool,
) -> SwipeDecision {
    let commits = delta_x.abs() > TOGGLE_THRESHOLD_PX && (has_neighbor || wraps);
    match (swipe, commits) {
        (SwipeState::NotSwiping, _) => SwipeDecision::Nothing,
        (SwipeState::SwipingLeft, true) => SwipeDecision::Next,
        (SwipeState::SwipingRight, true) => SwipeDecision::Previous,
        (_, false) => SwipeDecision::Reset,
    }
}
