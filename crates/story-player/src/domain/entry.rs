//! Entry views and batch validation.

use serde::Serialize;
use story_player_core::entry::EntryDescriptor;
use story_player_core::error::PlayerError;

/// Read-only snapshot of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    /// Position in append order.
    pub index: usize,
    /// Source address.
    pub locator: String,
    /// Optional title.
    pub title: Option<String>,
    /// Optional poster image.
    pub poster_image: Option<String>,
    /// Distance from the active entry after the last reconciliation pass.
    pub distance: usize,
    /// Whether the entry has a usable frame resource.
    pub has_frame: bool,
    /// Whether the frame is in the visual tree.
    pub attached: bool,
    /// Whether the story reported its content loaded this attach cycle.
    pub content_loaded: bool,
}

/// Validates an append batch. Nothing may be mutated unless this succeeds.
///
/// # Errors
///
/// Returns `PlayerError::Validation` naming the first malformed element.
pub fn validate_batch(batch: &[EntryDescriptor]) -> Result<(), PlayerError> {
    match batch.iter().position(|d| !d.is_well_formed()) {
        Some(position) => Err(PlayerError::Validation(format!(
            "\"stories\" parameter has the wrong structure: element {position} has no href"
        ))),
        None => Ok(()),
    }
}

/// Normalizes a declared title: trimmed, with blank treated as absent.
#[must_use]
pub fn normalize_title(title: Option<&str>) -> Option<String> {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
}
