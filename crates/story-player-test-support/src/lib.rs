//! Shared test mocks and utilities for the story player.

mod fetch;
mod harness;
mod host;
mod runtime;
mod surface;
mod transport;

pub use fetch::{RecordingPageScroller, RewritingResolver, ScrollCall, StaticFetcher};
pub use harness::{HOST_ORIGIN, Harness};
pub use host::RecordingHost;
pub use runtime::{run_local, settle};
pub use surface::{FrameProbe, RecordingSurface};
pub use transport::{ScriptedTransport, SentMessage};
