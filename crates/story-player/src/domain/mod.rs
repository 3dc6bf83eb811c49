//! Pure player domain: configuration, entries, gestures, addressing.

pub mod config;
pub mod entry;
pub mod gesture;
pub mod location;
pub mod navigation;
