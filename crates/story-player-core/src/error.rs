//! Player error types.

use thiserror::Error;

/// Top-level player error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// Malformed caller input: an append batch, a configuration block, or a
    /// lifecycle call made in the wrong state.
    #[error("validation error: {0}")]
    Validation(String),

    /// No entry matches the requested locator.
    #[error("story not found in the player: {0}")]
    NotFound(String),

    /// A navigation target fell outside the sequence with wrap disabled.
    #[error("out of story range: target {target} with {len} stories")]
    OutOfRange {
        /// The requested absolute index.
        target: i64,
        /// The sequence length at the time of the request.
        len: usize,
    },

    /// The handshake with an embedded document failed.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Fetching more stories failed.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// A frame does not support a required sandbox capability.
    #[error("frame doesn't support: {0}")]
    UnsupportedCapability(String),

    /// A request over an established document connection failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// A superseded active-entry load wait. Never surfaced to the host.
    #[error("cancelled: superseded by a newer active story load")]
    Cancelled,
}

impl PlayerError {
    /// Returns true for the internal cancellation marker.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_is_cancellation() {
        assert!(PlayerError::Cancelled.is_cancellation());
    }

    #[test]
    fn test_other_errors_are_not_cancellation() {
        assert!(!PlayerError::Handshake("timeout".into()).is_cancellation());
        assert!(!PlayerError::Validation("bad".into()).is_cancellation());
    }

    #[test]
    fn test_out_of_range_message_names_target_and_len() {
        let err = PlayerError::OutOfRange { target: 5, len: 3 };
        assert_eq!(
            err.to_string(),
            "out of story range: target 5 with 3 stories"
        );
    }
}
