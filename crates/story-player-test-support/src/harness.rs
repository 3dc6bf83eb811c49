//! A bundle of recording collaborators.

use std::rc::Rc;

use story_player_core::collaborators::Collaborators;

use crate::fetch::{RecordingPageScroller, RewritingResolver, StaticFetcher};
use crate::host::RecordingHost;
use crate::surface::RecordingSurface;
use crate::transport::ScriptedTransport;

/// Origin the harness reports for the host page.
pub const HOST_ORIGIN: &str = "https://publisher.example";

/// Every collaborator the player needs, each inspectable by the test.
#[derive(Debug, Clone)]
pub struct Harness {
    /// Visual tree.
    pub surface: Rc<RecordingSurface>,
    /// Document transport.
    pub transport: ScriptedTransport,
    /// Host event sink.
    pub host: Rc<RecordingHost>,
    /// Serving-address resolver.
    pub resolver: Rc<RewritingResolver>,
    /// Story fetcher.
    pub fetcher: Rc<StaticFetcher>,
    /// Page scroller.
    pub scroller: Rc<RecordingPageScroller>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::with_surface(RecordingSurface::new())
    }
}

impl Harness {
    /// Creates a harness with fresh recorders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a harness around a preconfigured surface.
    #[must_use]
    pub fn with_surface(surface: RecordingSurface) -> Self {
        Self {
            surface: Rc::new(surface),
            transport: ScriptedTransport::new(),
            host: Rc::new(RecordingHost::new()),
            resolver: Rc::new(RewritingResolver::new()),
            fetcher: Rc::new(StaticFetcher::new()),
            scroller: Rc::new(RecordingPageScroller::new()),
        }
    }

    /// Wires the recorders into player collaborators.
    #[must_use]
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            surface: self.surface.clone(),
            transport: Rc::new(self.transport.clone()),
            host: self.host.clone(),
            resolver: self.resolver.clone(),
            fetcher: self.fetcher.clone(),
            page_scroller: Some(self.scroller.clone()),
            host_origin: HOST_ORIGIN.to_owned(),
        }
    }
}
