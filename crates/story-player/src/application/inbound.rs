//! Handling of messages sent by story documents: touch gestures, navigation
//! requests, state updates and the content-loaded signal.

use std::rc::Rc;

use serde_json::Value;
use story_player_core::host::{PlayerEvent, TouchPhase};
use story_player_core::scroll::PageScroller;
use story_player_core::surface::FrameTransform;
use tracing::{debug, trace};

use super::messaging::{
    DocumentState, InboundMessage, MessagingChannel, SKIP_NEXT_EVENTS, SelectDirection,
    StateUpdate,
};
use super::player::PlayerCore;
use crate::domain::gesture::{
    EndOutcome, MoveOutcome, SwipeDecision, SwipeState, TouchEvent, decide_swipe,
};

impl PlayerCore {
    /// Dispatches one inbound message from the document behind `channel`.
    pub(crate) fn handle_inbound(
        self: &Rc<Self>,
        channel: &Rc<MessagingChannel>,
        message: InboundMessage,
    ) {
        let index = channel.index();
        let current = self
            .state
            .borrow()
            .entries
            .get(index)
            .is_some_and(|e| e.cycle == Some(channel.id()));
        if !current {
            debug!(
                index,
                channel_id = %channel.id(),
                "ignoring message from a superseded document"
            );
            return;
        }

        match message {
            InboundMessage::TouchStart { event, touches } => self.on_touch_start(&event, touches),
            InboundMessage::TouchMove { event, touches } => self.on_touch_move(&event, touches),
            InboundMessage::TouchEnd { event, touches } => self.on_touch_end(&event, touches),
            InboundMessage::SelectDocument(direction) => self.on_select_document(direction),
            InboundMessage::StateUpdate(update) => self.on_state_update(channel, update),
            InboundMessage::ContentLoaded => self.on_content_loaded(index),
            InboundMessage::Unknown(name) => trace!(index, name, "unhandled story message"),
        }
    }

    fn on_content_loaded(&self, index: usize) {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.entries.get_mut(index) {
            entry.content_loaded = true;
        }
        if state.load.content_loaded(index) {
            debug!(index, "active story content loaded, releasing neighbors");
        }
    }

    fn on_select_document(self: &Rc<Self>, direction: Option<SelectDirection>) {
        let Some(direction) = direction else {
            return;
        };
        let (active, len) = {
            let state = self.state.borrow();
            (state.active, state.entries.len())
        };
        if !self.wraps() {
            match direction {
                SelectDirection::Next if active + 1 == len => self.emit(PlayerEvent::NoNextStory),
                SelectDirection::Previous if active == 0 => self.emit(PlayerEvent::NoPreviousStory),
                _ => {}
            }
        }
        drop(match direction {
            SelectDirection::Next => self.next(),
            SelectDirection::Previous => self.previous(),
        });
    }

    fn on_state_update(self: &Rc<Self>, channel: &Rc<MessagingChannel>, update: StateUpdate) {
        match update {
            StateUpdate::PageAttachment(open) => {
                if self.exit_control.is_some() {
                    self.collab.surface.set_exit_control_visible(!open);
                }
                self.emit(if open {
                    PlayerEvent::PageAttachmentOpen
                } else {
                    PlayerEvent::PageAttachmentClose
                });
            }
            StateUpdate::CurrentPageId(page_id) => {
                let core = Rc::clone(self);
                let channel = Rc::clone(channel);
                tokio::task::spawn_local(async move {
                    match channel.get_state(DocumentState::StoryProgress).await {
                        Ok(progress) => {
                            core.emit(PlayerEvent::StoryNavigation { page_id, progress });
                        }
                        Err(err) => debug!(error = %err, "failed reading story progress"),
                    }
                });
            }
            StateUpdate::Muted(muted) => self.emit(PlayerEvent::MutedState { muted }),
            StateUpdate::UiState(value) => self.state.borrow_mut().ui_state = Some(value),
            StateUpdate::PlayerEvent(name) => {
                if SKIP_NEXT_EVENTS.contains(&name.as_str()) {
                    drop(self.next());
                } else {
                    self.emit(PlayerEvent::Custom { name });
                }
            }
            StateUpdate::Other(key) => trace!(key, "unhandled document state"),
        }
    }

    fn on_touch_start(&self, event: &TouchEvent, touches: Value) {
        let Some(point) = event.primary() else {
            return;
        };
        self.state.borrow_mut().gesture.start(point);
        if let Some(scroller) = self.page_scroller() {
            scroller.on_touch_start(event.time_stamp, point.client_y);
        }
        self.emit(PlayerEvent::Touch {
            phase: TouchPhase::Start,
            touches,
            is_navigational_swipe: None,
        });
    }

    fn on_touch_move(&self, event: &TouchEvent, touches: Value) {
        let Some(point) = event.primary() else {
            return;
        };
        let axis = self.state.borrow().gesture.axis();
        self.emit(PlayerEvent::Touch {
            phase: TouchPhase::Move,
            touches,
            is_navigational_swipe: axis.as_navigational(),
        });

        let outcome = {
            let mut state = self.state.borrow_mut();
            let can_swipe = state.entries.len() > 1;
            state.gesture.on_move(point, can_swipe)
        };
        match outcome {
            MoveOutcome::Scroll { client_y } => {
                if let Some(scroller) = self.page_scroller() {
                    scroller.on_touch_move(event.time_stamp, client_y);
                }
            }
            MoveOutcome::Drag { delta_x, swipe } => {
                let mut guard = self.state.borrow_mut();
                let state = &mut *guard;
                let active = state.active;
                state.animation.transform(
                    active,
                    FrameTransform::Drag {
                        offset_px: delta_x,
                        panel_offset: 0,
                    },
                );
                if let Some((side, panel_offset)) = secondary(active, state.entries.len(), swipe) {
                    state.animation.transform(
                        side,
                        FrameTransform::Drag {
                            offset_px: delta_x,
                            panel_offset,
                        },
                    );
                }
            }
            MoveOutcome::LockedVertical | MoveOutcome::Ignored => {}
        }
    }

    fn on_touch_end(self: &Rc<Self>, event: &TouchEvent, touches: Value) {
        let axis = self.state.borrow().gesture.axis();
        self.emit(PlayerEvent::Touch {
            phase: TouchPhase::End,
            touches,
            is_navigational_swipe: axis.as_navigational(),
        });

        let (outcome, active, len) = {
            let mut state = self.state.borrow_mut();
            let outcome = state.gesture.end();
            (outcome, state.active, state.entries.len())
        };

        match outcome {
            EndOutcome::Swipe { delta_x, swipe } => {
                if len <= 1 {
                    return;
                }
                let neighbor = secondary(active, len, swipe);
                match decide_swipe(delta_x, swipe, neighbor.is_some(), self.wraps()) {
                    SwipeDecision::Next => drop(self.next()),
                    SwipeDecision::Previous => drop(self.previous()),
                    SwipeDecision::Reset => {
                        let mut state = self.state.borrow_mut();
                        state.animation.transform(active, FrameTransform::Reset);
                        if let Some((index, _)) = neighbor {
                            state.animation.transform(index, FrameTransform::Reset);
                        }
                    }
                    SwipeDecision::Nothing => {}
                }
            }
            EndOutcome::Scroll => {
                if let Some(scroller) = self.page_scroller() {
                    scroller.on_touch_end(event.time_stamp);
                }
            }
        }
    }

    fn page_scroller(&self) -> Option<&Rc<dyn PageScroller>> {
        if !self.config.page_scroll {
            return None;
        }
        self.collab.page_scroller.as_ref()
    }
}

/// The entry revealed by a drag in direction `swipe`, with its panel offset.
fn secondary(active: usize, len: usize, swipe: SwipeState) -> Option<(usize, i8)> {
    match swipe {
        SwipeState::SwipingLeft if active + 1 < len => Some((active + 1, 1)),
        SwipeState::SwipingRight if active > 0 => Some((active - 1, -1)),
        _ => None,
    }
}
