//! Entry descriptors supplied by the host or a story endpoint.

use serde::{Deserialize, Serialize};

/// One story as described by its author: where it lives and how to preview it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDescriptor {
    /// Opaque source address of the story document.
    #[serde(rename = "href", default)]
    pub locator: String,
    /// Optional human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Optional poster image shown while the frame loads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_image: Option<String>,
}

impl EntryDescriptor {
    /// Creates a descriptor with only a locator.
    #[must_use]
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            title: None,
            poster_image: None,
        }
    }

    /// Returns true when the locator is present and non-blank.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.locator.trim().is_empty()
    }
}
