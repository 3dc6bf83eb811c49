//! Index arithmetic for navigation: bounds, wrapping, positions, prefetch.

use story_player_core::error::PlayerError;
use story_player_core::surface::StoryPosition;

/// Fetch more stories once this many or fewer remain after the active one.
pub const FETCH_STORIES_THRESHOLD: usize = 2;

/// Outcome of a single-step move (`next`/`previous`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The adjacent index is out of bounds and wrap is disabled.
    Blocked,
    /// The adjacent index is out of bounds and wrap is enabled.
    Wrap,
    /// Move to this index.
    To(usize),
}

/// Returns true if `index` is outside `[0, len)`.
#[must_use]
pub fn is_out_of_bounds(index: i64, len: usize) -> bool {
    index < 0 || usize::try_from(index).map_or(true, |i| i >= len)
}

#[allow(clippy::cast_possible_wrap)]
fn signed(index: usize) -> i64 {
    index as i64
}

/// Resolves a one-story step from `active`.
#[must_use]
pub fn step(active: usize, delta: i64, len: usize, wraps: bool) -> Step {
    let target = signed(active).saturating_add(delta);
    if is_out_of_bounds(target, len) {
        return if wraps { Step::Wrap } else { Step::Blocked };
    }
    usize::try_from(target).map_or(Step::Blocked, Step::To)
}

/// Resolves the absolute target of `go(story_delta)`.
///
/// # Errors
///
/// Returns `PlayerError::OutOfRange` if the target is out of bounds and wrap
/// is disabled, or the sequence is empty. A target beyond the `i64` range is
/// reported saturated.
pub fn go_target(
    active: usize,
    story_delta: i64,
    len: usize,
    wraps: bool,
) -> Result<usize, PlayerError> {
    let target = signed(active).saturating_add(story_delta);
    if len == 0 || (!wraps && is_out_of_bounds(target, len)) {
        return Err(PlayerError::OutOfRange { target, len });
    }
    let span = signed(len);
    let wrapped = (signed(active) + story_delta.rem_euclid(span)) % span;
    usize::try_from(wrapped).map_err(|_| PlayerError::OutOfRange { target, len })
}

/// Position marker of `index` relative to `active`.
#[must_use]
pub fn position_of(index: usize, active: usize) -> StoryPosition {
    match index.cmp(&active) {
        std::cmp::Ordering::Equal => StoryPosition::Current,
        std::cmp::Ordering::Greater => StoryPosition::Next,
        std::cmp::Ordering::Less => StoryPosition::Previous,
    }
}

/// Number of stories after the active one.
#[must_use]
pub fn remaining(active: usize, len: usize) -> usize {
    len.saturating_sub(active + 1)
}

/// Whether `remaining` is low enough to fetch more stories.
#[must_use]
pub fn needs_more(remaining: usize) -> bool {
    remaining <= FETCH_STORIES_THRESHOLD
}
