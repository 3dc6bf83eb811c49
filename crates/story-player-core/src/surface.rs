//! Visual-tree abstractions: the player container and its story frames.

use serde::Serialize;

use crate::entry::EntryDescriptor;

/// Load state of the player container. Exactly one applies at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadState {
    /// A frame was built and has not reported yet.
    Loading,
    /// The most recent frame report was a successful load.
    Loaded,
    /// The most recent frame report was an error.
    Error,
}

/// Position marker of a frame relative to the active story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StoryPosition {
    /// One before the active story.
    Previous,
    /// The active story.
    Current,
    /// One after the active story.
    Next,
}

impl StoryPosition {
    /// Returns the signed marker value (-1, 0, 1).
    #[must_use]
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Previous => -1,
            Self::Current => 0,
            Self::Next => 1,
        }
    }
}

/// Horizontal transform applied to a frame while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum FrameTransform {
    /// Clear any drag transform and restore the default transition.
    Reset,
    /// Translate by `panel_offset` full widths plus `offset_px`, with
    /// transitions disabled.
    Drag {
        /// Live horizontal drag distance.
        offset_px: f64,
        /// Whole-width shift: 0 for the active frame, 1 or -1 for the side one.
        panel_offset: i8,
    },
}

impl FrameTransform {
    /// Renders the transform as a CSS `translate3d` value. `Reset` yields
    /// `None`.
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match *self {
            Self::Reset => None,
            Self::Drag {
                offset_px,
                panel_offset: 0,
            } => Some(format!("translate3d({offset_px}px, 0, 0)")),
            Self::Drag {
                offset_px,
                panel_offset,
            } if panel_offset > 0 => Some(format!(
                "translate3d(calc({}% + {offset_px}px), 0, 0)",
                i32::from(panel_offset) * 100
            )),
            Self::Drag {
                offset_px,
                panel_offset,
            } => Some(format!(
                "translate3d(calc({offset_px}px - {}%), 0, 0)",
                -i32::from(panel_offset) * 100
            )),
        }
    }
}

/// One isolated, sandboxed embedded-document container.
pub trait Frame {
    /// Reports whether a sandbox capability is supported. `None` means the
    /// environment cannot verify support.
    fn supports_capability(&self, capability: &str) -> Option<bool>;

    /// Grants a sandbox capability.
    fn add_capability(&mut self, capability: &str);

    /// Shows a poster image behind the frame while it loads.
    fn set_poster(&mut self, url: &str);

    /// Current source address; empty when cleared.
    fn src(&self) -> String;

    /// Assigns the source address, triggering a load.
    fn set_src(&mut self, src: &str);

    /// Sets the accessible title.
    fn set_title(&mut self, title: &str);

    /// Inserts the frame into the visual tree.
    fn attach(&mut self);

    /// Removes the frame from the visual tree. The resource itself survives.
    fn detach(&mut self);

    /// Whether the frame is currently in the visual tree.
    fn is_attached(&self) -> bool;

    /// Applies a drag transform.
    fn set_transform(&mut self, transform: &FrameTransform);

    /// Applies a position marker.
    fn set_position(&mut self, position: StoryPosition);

    /// Requests input focus.
    fn focus(&mut self);
}

/// The player container: creates frames and reflects container-level state.
pub trait PlayerSurface {
    /// Creates the frame resource for a story.
    fn create_frame(&self, entry: &EntryDescriptor) -> Box<dyn Frame>;

    /// Reflects the container load state.
    fn set_load_state(&self, state: LoadState);

    /// Enables or disables the animated transition between stories.
    fn set_navigation_transition(&self, enabled: bool);

    /// Shows or hides the legacy exit control.
    fn set_exit_control_visible(&self, visible: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_drag_renders_plain_translate() {
        let transform = FrameTransform::Drag {
            offset_px: -30.0,
            panel_offset: 0,
        };

        assert_eq!(
            transform.to_css().as_deref(),
            Some("translate3d(-30px, 0, 0)")
        );
    }

    #[test]
    fn test_next_side_drag_is_offset_by_full_width() {
        let transform = FrameTransform::Drag {
            offset_px: -30.0,
            panel_offset: 1,
        };

        assert_eq!(
            transform.to_css().as_deref(),
            Some("translate3d(calc(100% + -30px), 0, 0)")
        );
    }

    #[test]
    fn test_previous_side_drag_is_offset_by_negative_full_width() {
        let transform = FrameTransform::Drag {
            offset_px: 40.0,
            panel_offset: -1,
        };

        assert_eq!(
            transform.to_css().as_deref(),
            Some("translate3d(calc(40px - 100%), 0, 0)")
        );
    }

    #[test]
    fn test_reset_has_no_css() {
        assert_eq!(FrameTransform::Reset.to_css(), None);
    }
}
