//! Typed messaging protocol between the player and one story document.
//!
//! A [`MessagingChannel`] wraps the outbound half of a transport connection
//! for a single attach cycle. Inbound messages are parsed into
//! [`InboundMessage`] and dispatched by the player.

use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::{Value, json};
use story_player_core::error::PlayerError;
use story_player_core::transport::{DocumentConnection, HandshakeRequest, RawMessage};
use tokio::sync::mpsc;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use super::player::PlayerCore;
use crate::domain::config::ViewerControl;
use crate::domain::gesture::TouchEvent;
use crate::domain::location::{VisibilityState, encoded_location, origin_of};

/// Outbound message names.
pub mod outbound {
    /// Subscribes to a document state.
    pub const ON_DOCUMENT_STATE: &str = "onDocumentState";
    /// Reads a document state.
    pub const GET_DOCUMENT_STATE: &str = "getDocumentState";
    /// Writes a document state.
    pub const SET_DOCUMENT_STATE: &str = "setDocumentState";
    /// Sends custom viewer controls.
    pub const CUSTOM_DOCUMENT_UI: &str = "customDocumentUI";
    /// Changes the document's visibility state.
    pub const VISIBILITY_CHANGE: &str = "visibilitychange";
    /// Selects a page by id or delta.
    pub const SELECT_PAGE: &str = "selectPage";
    /// Rewinds the story to its first page.
    pub const REWIND: &str = "rewind";
}

/// Inbound message names.
pub mod inbound {
    /// Touch sequence start.
    pub const TOUCH_START: &str = "touchstart";
    /// Touch sequence move.
    pub const TOUCH_MOVE: &str = "touchmove";
    /// Touch sequence end.
    pub const TOUCH_END: &str = "touchend";
    /// Request to move to the next or previous story.
    pub const SELECT_DOCUMENT: &str = "selectDocument";
    /// A subscribed document state changed.
    pub const DOCUMENT_STATE_UPDATE: &str = "documentStateUpdate";
    /// The story's content finished loading.
    pub const STORY_CONTENT_LOADED: &str = "storyContentLoaded";
}

/// Player event names that skip to the next story.
pub const SKIP_NEXT_EVENTS: [&str; 2] =
    ["amp-story-player-skip-next", "amp-story-player-skip-to-next"];

/// Document state keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// Whether a page attachment is open.
    PageAttachment,
    /// Id of the current page.
    CurrentPageId,
    /// Whether the story is muted.
    Muted,
    /// Current UI state.
    UiState,
    /// Progress through the story.
    StoryProgress,
    /// Custom player events raised by the story.
    PlayerEvent,
}

impl DocumentState {
    /// States the player subscribes to on every new channel.
    pub const SUBSCRIBED: [Self; 4] = [
        Self::PageAttachment,
        Self::CurrentPageId,
        Self::Muted,
        Self::UiState,
    ];

    /// Returns the wire key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PageAttachment => "PAGE_ATTACHMENT_STATE",
            Self::CurrentPageId => "CURRENT_PAGE_ID",
            Self::Muted => "MUTED_STATE",
            Self::UiState => "UI_STATE",
            Self::StoryProgress => "STORY_PROGRESS",
            Self::PlayerEvent => "AMP_STORY_PLAYER_EVENT",
        }
    }

    fn from_wire(key: &str) -> Option<Self> {
        [
            Self::PageAttachment,
            Self::CurrentPageId,
            Self::Muted,
            Self::UiState,
            Self::StoryProgress,
            Self::PlayerEvent,
        ]
        .into_iter()
        .find(|state| state.as_str() == key)
    }
}

/// Page selection forwarded to a story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelection {
    /// Jump to the page with this id.
    Id(String),
    /// Move by this many pages.
    Delta(i64),
}

impl PageSelection {
    fn payload(&self) -> Value {
        match self {
            Self::Id(id) => json!({ "id": id }),
            Self::Delta(delta) => json!({ "delta": delta }),
        }
    }
}

/// Direction requested by a `selectDocument` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectDirection {
    /// `{"next": true}`.
    Next,
    /// `{"previous": true}`.
    Previous,
}

/// A document state change pushed by a story.
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    /// A page attachment opened or closed.
    PageAttachment(bool),
    /// The current page changed.
    CurrentPageId(String),
    /// The muted state changed.
    Muted(bool),
    /// The UI state changed.
    UiState(Value),
    /// The story raised a player event.
    PlayerEvent(String),
    /// A state the player does not handle.
    Other(String),
}

/// A parsed inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Touch sequence start; `touches` is the raw list for host passthrough.
    TouchStart { event: TouchEvent, touches: Value },
    /// Touch sequence move.
    TouchMove { event: TouchEvent, touches: Value },
    /// Touch sequence end.
    TouchEnd { event: TouchEvent, touches: Value },
    /// Move to an adjacent story.
    SelectDocument(Option<SelectDirection>),
    /// A subscribed state changed.
    StateUpdate(StateUpdate),
    /// The story's content finished loading.
    ContentLoaded,
    /// A message the player does not handle.
    Unknown(String),
}

impl InboundMessage {
    /// Parses a raw message. Malformed payloads degrade to defaults rather
    /// than failing, matching how documents omit absent fields.
    #[must_use]
    pub fn parse(message: RawMessage) -> Self {
        let RawMessage { name, payload } = message;
        match name.as_str() {
            inbound::TOUCH_START | inbound::TOUCH_MOVE | inbound::TOUCH_END => {
                let event: TouchEvent = serde_json::from_value(payload.clone()).unwrap_or_default();
                let touches = payload.get("touches").cloned().unwrap_or(Value::Null);
                match name.as_str() {
                    inbound::TOUCH_START => Self::TouchStart { event, touches },
                    inbound::TOUCH_MOVE => Self::TouchMove { event, touches },
                    _ => Self::TouchEnd { event, touches },
                }
            }
            inbound::SELECT_DOCUMENT => Self::SelectDocument(parse_direction(&payload)),
            inbound::DOCUMENT_STATE_UPDATE => Self::StateUpdate(parse_state_update(&payload)),
            inbound::STORY_CONTENT_LOADED => Self::ContentLoaded,
            _ => Self::Unknown(name),
        }
    }
}

fn parse_direction(payload: &Value) -> Option<SelectDirection> {
    let flag = |key: &str| payload.get(key).and_then(Value::as_bool).unwrap_or(false);
    if flag("next") {
        Some(SelectDirection::Next)
    } else if flag("previous") {
        Some(SelectDirection::Previous)
    } else {
        None
    }
}

fn parse_state_update(payload: &Value) -> StateUpdate {
    let key = payload.get("state").and_then(Value::as_str).unwrap_or_default();
    let value = payload.get("value").cloned().unwrap_or(Value::Null);
    match DocumentState::from_wire(key) {
        Some(DocumentState::PageAttachment) => {
            StateUpdate::PageAttachment(value.as_bool().unwrap_or(false))
        }
        Some(DocumentState::CurrentPageId) => {
            StateUpdate::CurrentPageId(value.as_str().unwrap_or_default().to_owned())
        }
        Some(DocumentState::Muted) => StateUpdate::Muted(value.as_bool().unwrap_or(false)),
        Some(DocumentState::UiState) => StateUpdate::UiState(value),
        Some(DocumentState::PlayerEvent) => {
            StateUpdate::PlayerEvent(value.as_str().unwrap_or_default().to_owned())
        }
        Some(DocumentState::StoryProgress) | None => StateUpdate::Other(key.to_owned()),
    }
}

/// The messaging channel to one story document for one attach cycle.
pub struct MessagingChannel {
    id: Uuid,
    index: usize,
    connection: Rc<dyn DocumentConnection>,
}

impl fmt::Debug for MessagingChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessagingChannel")
            .field("id", &self.id)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl MessagingChannel {
    /// Wraps an established connection.
    #[must_use]
    pub fn new(id: Uuid, index: usize, connection: Rc<dyn DocumentConnection>) -> Self {
        Self {
            id,
            index,
            connection,
        }
    }

    /// Attach-cycle id of this channel.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Index of the entry this channel belongs to.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Subscribes to a document state.
    pub fn subscribe(&self, state: DocumentState) {
        self.connection
            .post(outbound::ON_DOCUMENT_STATE, json!({ "state": state.as_str() }));
    }

    /// Sends custom viewer controls.
    pub fn send_controls(&self, controls: &[ViewerControl]) {
        self.connection
            .post(outbound::CUSTOM_DOCUMENT_UI, json!({ "controls": controls }));
    }

    /// Reads a document state and returns its value.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn get_state(&self, state: DocumentState) -> Result<Value, PlayerError> {
        let response = self
            .connection
            .request(outbound::GET_DOCUMENT_STATE, json!({ "state": state.as_str() }))
            .await?;
        Ok(response.get("value").cloned().unwrap_or(Value::Null))
    }

    /// Writes a document state.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn set_state(&self, state: DocumentState, value: Value) -> Result<(), PlayerError> {
        self.connection
            .request(
                outbound::SET_DOCUMENT_STATE,
                json!({ "state": state.as_str(), "value": value }),
            )
            .await
            .map(drop)
    }

    /// Changes the document's visibility state.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn change_visibility(&self, visibility: VisibilityState) -> Result<(), PlayerError> {
        self.connection
            .request(outbound::VISIBILITY_CHANGE, json!({ "state": visibility.as_str() }))
            .await
            .map(drop)
    }

    /// Selects a page.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn select_page(&self, selection: &PageSelection) -> Result<(), PlayerError> {
        self.connection
            .request(outbound::SELECT_PAGE, selection.payload())
            .await
            .map(drop)
    }

    /// Rewinds the story to its first page.
    ///
    /// # Errors
    ///
    /// Propagates transport failures.
    pub async fn rewind(&self) -> Result<(), PlayerError> {
        self.connection
            .request(outbound::REWIND, json!({}))
            .await
            .map(drop)
    }
}

impl PlayerCore {
    /// Opens the messaging channel for one attach cycle of the entry at
    /// `index`. The entry's channel signal is resolved only if the cycle is
    /// still current once the handshake completes.
    #[instrument(skip(self, cycle, locator), fields(channel_id = %cycle))]
    pub(crate) async fn connect(self: Rc<Self>, index: usize, cycle: Uuid, locator: String) {
        let url = match self.serving_url(&locator).await {
            Ok(url) => url,
            Err(err) => {
                error!(error = %err, "failed to resolve story address for handshake");
                return;
            }
        };
        let is_proxy = self.collab.resolver.is_proxy_origin(&url);
        let origin =
            match encoded_location(&url, &self.params, VisibilityState::Inactive, is_proxy) {
                Ok(location) => origin_of(&location).unwrap_or_default(),
                Err(err) => {
                    error!(error = %err, "cannot derive handshake origin");
                    return;
                }
            };

        let request = HandshakeRequest { index, url, origin };
        let connection = match self.collab.transport.handshake(request).await {
            Ok(connection) => connection,
            Err(err) => {
                error!(error = %err, "story messaging handshake failed");
                return;
            }
        };

        let mut state = self.state.borrow_mut();
        let len = state.entries.len();
        let Some(entry) = state.entries.get_mut(index) else {
            return;
        };
        if entry.cycle != Some(cycle) {
            warn!("discarding connection for a superseded attach cycle");
            return;
        }

        let channel = Rc::new(MessagingChannel::new(cycle, index, connection.outbound));
        for document_state in DocumentState::SUBSCRIBED {
            channel.subscribe(document_state);
        }
        if let Some(controls) = self.config.controls_for(index, len) {
            channel.send_controls(&controls);
        }

        entry.pump = Some(tokio::task::spawn_local(pump(
            Rc::downgrade(&self),
            Rc::clone(&channel),
            connection.inbound,
        )));
        entry.channel.resolve(channel);
        debug!("story messaging channel established");
    }
}

/// Delivers inbound messages for one channel until the transport closes, the
/// entry detaches or the player is dropped.
async fn pump(
    core: Weak<PlayerCore>,
    channel: Rc<MessagingChannel>,
    mut inbound: mpsc::UnboundedReceiver<RawMessage>,
) {
    while let Some(raw) = inbound.recv().await {
        let Some(core) = core.upgrade() else {
            break;
        };
        core.handle_inbound(&channel, InboundMessage::parse(raw));
    }
    debug!(channel_id = %channel.id(), "story messaging channel closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_touch_start_keeps_raw_touches() {
        // Arrange
        let raw = RawMessage::new(
            inbound::TOUCH_START,
            json!({
                "timeStamp": 12.0,
                "touches": [{ "screenX": 10.0, "screenY": 20.0, "clientX": 1.0, "clientY": 2.0 }]
            }),
        );

        // Act
        let message = InboundMessage::parse(raw);

        // Assert
        match message {
            InboundMessage::TouchStart { event, touches } => {
                assert_eq!(event.time_stamp, 12.0);
                assert_eq!(event.primary().map(|p| p.screen_x), Some(10.0));
                assert_eq!(touches[0]["clientY"], json!(2.0));
            }
            other => panic!("expected TouchStart, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_touch_without_touches_has_no_primary() {
        let message = InboundMessage::parse(RawMessage::new(inbound::TOUCH_END, json!({})));

        match message {
            InboundMessage::TouchEnd { event, touches } => {
                assert!(event.primary().is_none());
                assert_eq!(touches, Value::Null);
            }
            other => panic!("expected TouchEnd, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_select_document_direction() {
        assert_eq!(
            InboundMessage::parse(RawMessage::new(
                inbound::SELECT_DOCUMENT,
                json!({ "next": true }),
            )),
            InboundMessage::SelectDocument(Some(SelectDirection::Next))
        );
        assert_eq!(
            InboundMessage::parse(RawMessage::new(
                inbound::SELECT_DOCUMENT,
                json!({ "previous": true })
            )),
            InboundMessage::SelectDocument(Some(SelectDirection::Previous))
        );
        assert_eq!(
            InboundMessage::parse(RawMessage::new(inbound::SELECT_DOCUMENT, json!({}))),
            InboundMessage::SelectDocument(None)
        );
    }

    #[test]
    fn test_parse_state_updates() {
        let update = |state: &str, value: Value| {
            InboundMessage::parse(RawMessage::new(
                inbound::DOCUMENT_STATE_UPDATE,
                json!({ "state": state, "value": value }),
            ))
        };

        assert_eq!(
            update("PAGE_ATTACHMENT_STATE", json!(true)),
            InboundMessage::StateUpdate(StateUpdate::PageAttachment(true))
        );
        assert_eq!(
            update("CURRENT_PAGE_ID", json!("cover")),
            InboundMessage::StateUpdate(StateUpdate::CurrentPageId("cover".to_owned()))
        );
        assert_eq!(
            update("MUTED_STATE", json!(false)),
            InboundMessage::StateUpdate(StateUpdate::Muted(false))
        );
        assert_eq!(
            update("AMP_STORY_PLAYER_EVENT", json!("amp-story-player-skip-next")),
            InboundMessage::StateUpdate(StateUpdate::PlayerEvent(
                "amp-story-player-skip-next".to_owned()
            ))
        );
        assert_eq!(
            update("BOOKEND_STATE", json!(1)),
            InboundMessage::StateUpdate(StateUpdate::Other("BOOKEND_STATE".to_owned()))
        );
    }

    #[test]
    fn test_parse_content_loaded_and_unknown() {
        assert_eq!(
            InboundMessage::parse(RawMessage::new(inbound::STORY_CONTENT_LOADED, json!({}))),
            InboundMessage::ContentLoaded
        );
        assert_eq!(
            InboundMessage::parse(RawMessage::new("share", json!({}))),
            InboundMessage::Unknown("share".to_owned())
        );
    }

    #[test]
    fn test_page_selection_payloads() {
        assert_eq!(PageSelection::Id("p2".to_owned()).payload(), json!({ "id": "p2" }));
        assert_eq!(PageSelection::Delta(-1).payload(), json!({ "delta": -1 }));
    }
}
