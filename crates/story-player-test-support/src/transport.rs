//! Test transport — handshakes succeed instantly unless told otherwise, and
//! every outbound message is recorded.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::{Value, json};
use story_player_core::error::PlayerError;
use story_player_core::transport::{
    Connection, DocumentConnection, HandshakeRequest, MessagingTransport, RawMessage,
};
use tokio::sync::mpsc;

/// One message the player sent to a document.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    /// Index of the receiving entry.
    pub index: usize,
    /// Message name.
    pub name: String,
    /// Message payload.
    pub payload: Value,
    /// Whether the player waited for an acknowledgement.
    pub acknowledged: bool,
}

#[derive(Debug, Default)]
struct TransportState {
    handshakes: Vec<HandshakeRequest>,
    failing: HashSet<usize>,
    inbound: HashMap<usize, mpsc::UnboundedSender<RawMessage>>,
    sent: Vec<SentMessage>,
    document_states: HashMap<String, Value>,
}

/// A transport whose documents are driven by the test.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    state: Rc<RefCell<TransportState>>,
}

impl ScriptedTransport {
    /// Creates a transport where every handshake succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handshakes for the entry at `index` fail from now on.
    pub fn fail_handshake(&self, index: usize) {
        self.state.borrow_mut().failing.insert(index);
    }

    /// `getDocumentState` requests for `key` are answered with `value`.
    pub fn answer_state(&self, key: &str, value: Value) {
        self.state
            .borrow_mut()
            .document_states
            .insert(key.to_owned(), value);
    }

    /// Every handshake attempted, in order.
    #[must_use]
    pub fn handshakes(&self) -> Vec<HandshakeRequest> {
        self.state.borrow().handshakes.clone()
    }

    /// Number of handshakes attempted for `index`.
    #[must_use]
    pub fn handshake_count(&self, index: usize) -> usize {
        self.state
            .borrow()
            .handshakes
            .iter()
            .filter(|h| h.index == index)
            .count()
    }

    /// Every message sent, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.borrow().sent.clone()
    }

    /// Messages sent to the entry at `index`.
    #[must_use]
    pub fn sent_to(&self, index: usize) -> Vec<SentMessage> {
        self.state
            .borrow()
            .sent
            .iter()
            .filter(|m| m.index == index)
            .cloned()
            .collect()
    }

    /// Delivers a message from the document of the entry at `index`.
    /// Returns false if that entry has no open connection.
    pub fn send(&self, index: usize, name: &str, payload: Value) -> bool {
        self.state
            .borrow()
            .inbound
            .get(&index)
            .is_some_and(|tx| tx.send(RawMessage::new(name, payload)).is_ok())
    }

    /// Whether the latest connection of the entry at `index` is still read
    /// by the player.
    #[must_use]
    pub fn is_connected(&self, index: usize) -> bool {
        self.state
            .borrow()
            .inbound
            .get(&index)
            .is_some_and(|tx| !tx.is_closed())
    }
}

#[async_trait(?Send)]
impl MessagingTransport for ScriptedTransport {
    async fn handshake(&self, request: HandshakeRequest) -> Result<Connection, PlayerError> {
        let index = request.index;
        let mut state = self.state.borrow_mut();
        state.handshakes.push(request);
        if state.failing.contains(&index) {
            return Err(PlayerError::Handshake(format!(
                "no handshake from story {index}"
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.inbound.insert(index, tx);
        Ok(Connection {
            outbound: Rc::new(ScriptedConnection {
                index,
                state: Rc::clone(&self.state),
            }),
            inbound: rx,
        })
    }
}

struct ScriptedConnection {
    index: usize,
    state: Rc<RefCell<TransportState>>,
}

impl ScriptedConnection {
    fn record(&self, name: &str, payload: &Value, acknowledged: bool) {
        self.state.borrow_mut().sent.push(SentMessage {
            index: self.index,
            name: name.to_owned(),
            payload: payload.clone(),
            acknowledged,
        });
    }
}

#[async_trait(?Send)]
impl DocumentConnection for ScriptedConnection {
    fn post(&self, name: &str, payload: Value) {
        self.record(name, &payload, false);
    }

    async fn request(&self, name: &str, payload: Value) -> Result<Value, PlayerError> {
        self.record(name, &payload, true);
        if name != "getDocumentState" {
            return Ok(json!({}));
        }
        let key = payload
            .get("state")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let value = self
            .state
            .borrow()
            .document_states
            .get(&key)
            .cloned()
            .unwrap_or(Value::Null);
        Ok(json!({ "state": key, "value": value }))
    }
}
