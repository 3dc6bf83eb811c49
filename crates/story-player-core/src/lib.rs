//! Story Player Core — shared abstractions.
//!
//! This crate defines the error taxonomy, the single-resolution signal type,
//! and the collaborator traits the player is written against. It contains no
//! player logic and no platform code.

pub mod collaborators;
pub mod entry;
pub mod error;
pub mod fetch;
pub mod host;
pub mod resolve;
pub mod scroll;
pub mod signal;
pub mod surface;
pub mod transport;
