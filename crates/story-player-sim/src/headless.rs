//! Headless collaborators: a surface without pixels, a loopback transport
//! whose documents are driven by the script, and a host that logs events.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::{Value, json};
use story_player::domain::config::SUPPORTED_SERVING_HOSTS;
use story_player_core::entry::EntryDescriptor;
use story_player_core::error::PlayerError;
use story_player_core::host::{HostEvents, PlayerEvent};
use story_player_core::resolve::ServingResolver;
use story_player_core::surface::{Frame, FrameTransform, LoadState, PlayerSurface, StoryPosition};
use story_player_core::transport::{
    Connection, DocumentConnection, HandshakeRequest, MessagingTransport, RawMessage,
};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};
use url::{Position, Url};

/// A surface whose frames only log what would happen to them.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    created: Cell<usize>,
}

impl PlayerSurface for HeadlessSurface {
    fn create_frame(&self, entry: &EntryDescriptor) -> Box<dyn Frame> {
        let id = self.created.get();
        self.created.set(id + 1);
        debug!(frame = id, locator = %entry.locator, "created frame");
        Box::new(HeadlessFrame {
            id,
            src: String::new(),
            attached: false,
        })
    }

    fn set_load_state(&self, state: LoadState) {
        debug!(?state, "player load state");
    }

    fn set_navigation_transition(&self, enabled: bool) {
        debug!(enabled, "navigation transition");
    }

    fn set_exit_control_visible(&self, visible: bool) {
        debug!(visible, "exit control visibility");
    }
}

struct HeadlessFrame {
    id: usize,
    src: String,
    attached: bool,
}

impl Frame for HeadlessFrame {
    fn supports_capability(&self, _capability: &str) -> Option<bool> {
        Some(true)
    }

    fn add_capability(&mut self, capability: &str) {
        trace!(frame = self.id, capability, "granted capability");
    }

    fn set_poster(&mut self, url: &str) {
        trace!(frame = self.id, url, "poster");
    }

    fn src(&self) -> String {
        self.src.clone()
    }

    fn set_src(&mut self, src: &str) {
        debug!(frame = self.id, src, "frame source");
        self.src = src.to_owned();
    }

    fn set_title(&mut self, title: &str) {
        trace!(frame = self.id, title, "frame title");
    }

    fn attach(&mut self) {
        debug!(frame = self.id, "frame attached");
        self.attached = true;
    }

    fn detach(&mut self) {
        debug!(frame = self.id, "frame detached");
        self.attached = false;
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn set_transform(&mut self, transform: &FrameTransform) {
        trace!(frame = self.id, css = ?transform.to_css(), "frame transform");
    }

    fn set_position(&mut self, position: StoryPosition) {
        trace!(frame = self.id, position = position.as_i8(), "frame position");
    }

    fn focus(&mut self) {
        debug!(frame = self.id, "frame focused");
    }
}

/// Handshakes succeed immediately; the script plays the documents' side.
#[derive(Debug, Clone, Default)]
pub struct LoopbackTransport {
    documents: Rc<RefCell<HashMap<usize, mpsc::UnboundedSender<RawMessage>>>>,
}

impl LoopbackTransport {
    /// Delivers a message from the document of the entry at `index`.
    /// Returns false if that document is not connected.
    pub fn deliver(&self, index: usize, name: &str, payload: Value) -> bool {
        self.documents
            .borrow()
            .get(&index)
            .is_some_and(|tx| tx.send(RawMessage::new(name, payload)).is_ok())
    }
}

#[async_trait(?Send)]
impl MessagingTransport for LoopbackTransport {
    async fn handshake(&self, request: HandshakeRequest) -> Result<Connection, PlayerError> {
        info!(index = request.index, origin = %request.origin, "document handshake");
        let (tx, rx) = mpsc::unbounded_channel();
        self.documents.borrow_mut().insert(request.index, tx);
        Ok(Connection {
            outbound: Rc::new(LoggingConnection {
                index: request.index,
            }),
            inbound: rx,
        })
    }
}

struct LoggingConnection {
    index: usize,
}

#[async_trait(?Send)]
impl DocumentConnection for LoggingConnection {
    fn post(&self, name: &str, payload: Value) {
        info!(index = self.index, message_name = name, %payload, "posted to document");
    }

    async fn request(&self, name: &str, payload: Value) -> Result<Value, PlayerError> {
        info!(index = self.index, message_name = name, %payload, "requested from document");
        let state = payload.get("state").cloned().unwrap_or(Value::Null);
        Ok(json!({ "state": state, "value": Value::Null }))
    }
}

/// Logs every player event as JSON and counts them.
#[derive(Debug, Default)]
pub struct LoggingHost {
    dispatched: Cell<usize>,
}

impl LoggingHost {
    /// Number of events dispatched so far.
    #[must_use]
    pub fn dispatched(&self) -> usize {
        self.dispatched.get()
    }
}

impl HostEvents for LoggingHost {
    fn dispatch(&self, event: PlayerEvent) {
        self.dispatched.set(self.dispatched.get() + 1);
        let payload = serde_json::to_string(&event).unwrap_or_default();
        info!(event = event.name(), %payload, "player event");
    }
}

/// Rewrites locators into cache URLs: `https://a.example/x` served by
/// `cdn.ampproject.org` becomes `https://a-example.cdn.ampproject.org/c/s/a.example/x`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheUrlResolver;

#[async_trait(?Send)]
impl ServingResolver for CacheUrlResolver {
    fn is_proxy_origin(&self, url: &str) -> bool {
        Url::parse(url).ok().is_some_and(|url| {
            url.host_str().is_some_and(|domain| {
                SUPPORTED_SERVING_HOSTS
                    .iter()
                    .any(|host| domain.ends_with(&format!(".{host}")))
            })
        })
    }

    async fn serving_url(&self, host: &str, locator: &str) -> Result<String, PlayerError> {
        let url = Url::parse(locator).map_err(|err| {
            PlayerError::Validation(format!("cannot serve story address {locator}: {err}"))
        })?;
        let prefix = match url.scheme() {
            "https" => "/c/s/",
            "http" => "/c/",
            scheme => {
                return Err(PlayerError::Validation(format!(
                    "cannot serve a {scheme} story address: {locator}"
                )));
            }
        };
        let Some(domain) = url.host_str() else {
            return Err(PlayerError::Validation(format!(
                "story address has no host: {locator}"
            )));
        };
        let subdomain = domain.replace('-', "--").replace('.', "-");
        let rest = &url[Position::BeforeHost..];
        Ok(format!("https://{subdomain}.{host}{prefix}{rest}"))
    }
}
