//! The bundle of collaborators a player is wired with.

use std::rc::Rc;

use crate::fetch::StoryFetcher;
use crate::host::HostEvents;
use crate::resolve::ServingResolver;
use crate::scroll::PageScroller;
use crate::surface::PlayerSurface;
use crate::transport::MessagingTransport;

/// Everything the player talks to outside itself.
#[derive(Clone)]
pub struct Collaborators {
    /// The visual tree.
    pub surface: Rc<dyn PlayerSurface>,
    /// Cross-document handshake and transport.
    pub transport: Rc<dyn MessagingTransport>,
    /// Receiver of player events.
    pub host: Rc<dyn HostEvents>,
    /// Serving-address rewrite.
    pub resolver: Rc<dyn ServingResolver>,
    /// Source of additional stories.
    pub fetcher: Rc<dyn StoryFetcher>,
    /// Host page scroller driven by vertical swipes.
    pub page_scroller: Option<Rc<dyn PageScroller>>,
    /// Origin of the host page.
    pub host_origin: String,
}
