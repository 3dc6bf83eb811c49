//! Events emitted to the embedding host.

use serde::Serialize;
use serde_json::Value;

/// Legacy exit control kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitControl {
    /// `back-button`.
    Back,
    /// `close-button`.
    Close,
}

/// Touch lifecycle phase forwarded to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    /// `touchstart`.
    Start,
    /// `touchmove`.
    Move,
    /// `touchend`.
    End,
}

/// An event dispatched on the player element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerEvent {
    /// The player finished building.
    Ready,
    /// The active story changed.
    Navigation {
        /// New active index.
        index: usize,
        /// Number of stories after the active one.
        remaining: usize,
    },
    /// The active story moved to a different page.
    #[serde(rename_all = "camelCase")]
    StoryNavigation {
        /// New page id.
        page_id: String,
        /// Progress value reported by the story.
        progress: Value,
    },
    /// A page attachment opened in the active story.
    PageAttachmentOpen,
    /// A page attachment closed in the active story.
    PageAttachmentClose,
    /// The active story changed its muted state.
    MutedState {
        /// Whether the story is muted.
        muted: bool,
    },
    /// A story asked for its next neighbor but it is the last one.
    NoNextStory,
    /// A story asked for its previous neighbor but it is the first one.
    NoPreviousStory,
    /// Raw touch lifecycle passthrough.
    #[serde(rename_all = "camelCase")]
    Touch {
        /// Lifecycle phase.
        phase: TouchPhase,
        /// Touch list as received from the document.
        touches: Value,
        /// Axis-lock decision at the time of the event, if made.
        is_navigational_swipe: Option<bool>,
    },
    /// The legacy exit control was activated.
    ExitControl {
        /// Which control.
        kind: ExitControl,
    },
    /// A custom event originating from an embedded document.
    Custom {
        /// Event name.
        name: String,
    },
}

impl PlayerEvent {
    /// Returns the DOM event name this event is dispatched under.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Ready => "ready",
            Self::Navigation { .. } => "navigation",
            Self::StoryNavigation { .. } => "storyNavigation",
            Self::PageAttachmentOpen => "page-attachment-open",
            Self::PageAttachmentClose => "page-attachment-close",
            Self::MutedState { .. } => "amp-story-muted-state",
            Self::NoNextStory => "noNextStory",
            Self::NoPreviousStory => "noPreviousStory",
            Self::Touch {
                phase: TouchPhase::Start,
                ..
            } => "amp-story-player-touchstart",
            Self::Touch {
                phase: TouchPhase::Move,
                ..
            } => "amp-story-player-touchmove",
            Self::Touch {
                phase: TouchPhase::End,
                ..
            } => "amp-story-player-touchend",
            Self::ExitControl {
                kind: ExitControl::Back,
            } => "amp-story-player-back",
            Self::ExitControl {
                kind: ExitControl::Close,
            } => "amp-story-player-close",
            Self::Custom { name } => name,
        }
    }
}

/// Receives events dispatched by the player.
pub trait HostEvents {
    /// Dispatches one event.
    fn dispatch(&self, event: PlayerEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_serializes_with_type_tag() {
        let event = PlayerEvent::Navigation {
            index: 1,
            remaining: 1,
        };

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "type": "navigation", "index": 1, "remaining": 1 })
        );
    }

    #[test]
    fn test_custom_event_uses_its_own_name() {
        let event = PlayerEvent::Custom {
            name: "amp-story-player-share".to_owned(),
        };

        assert_eq!(event.name(), "amp-story-player-share");
    }

    #[test]
    fn test_exit_control_names_match_legacy_events() {
        assert_eq!(
            PlayerEvent::ExitControl {
                kind: ExitControl::Close
            }
            .name(),
            "amp-story-player-close"
        );
    }
}
