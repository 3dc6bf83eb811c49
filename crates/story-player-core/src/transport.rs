//! Cross-document transport abstraction.
//!
//! The transport performs the handshake with an embedded document and carries
//! messages in both directions. The player layers its typed protocol on top.

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::PlayerError;

/// An untyped inbound message from an embedded document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    /// Message name, e.g. `touchstart` or `documentStateUpdate`.
    pub name: String,
    /// Message payload.
    pub payload: Value,
}

impl RawMessage {
    /// Creates a raw message.
    #[must_use]
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Outbound half of an established document connection.
#[async_trait(?Send)]
pub trait DocumentConnection {
    /// Sends a message without waiting for a response.
    fn post(&self, name: &str, payload: Value);

    /// Sends a message and waits for the document's acknowledgement.
    async fn request(&self, name: &str, payload: Value) -> Result<Value, PlayerError>;
}

/// An established connection: outbound sender plus inbound message stream.
pub struct Connection {
    /// Outbound half.
    pub outbound: Rc<dyn DocumentConnection>,
    /// Inbound messages, in arrival order.
    pub inbound: mpsc::UnboundedReceiver<RawMessage>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// Parameters of one handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    /// Index of the entry whose frame is being connected.
    pub index: usize,
    /// The entry's resolved serving address.
    pub url: String,
    /// Origin the document is expected to report.
    pub origin: String,
}

/// Performs the handshake with the document inside an entry's frame.
#[async_trait(?Send)]
pub trait MessagingTransport {
    /// Waits for the document's handshake and returns the connection.
    async fn handshake(&self, request: HandshakeRequest) -> Result<Connection, PlayerError>;
}
