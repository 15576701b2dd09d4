//! Event message framing.
//!
//! [`Connection::emit`](crate::Connection::emit) turns an action name and a
//! payload into one text message. How that message looks is an application
//! convention, so it is pluggable through [`EventFraming`].

use serde_json::{json, Value};

use crate::error::{WsError, WsResult};

/// Socket.IO packet prefix: Engine.IO "message" (4) carrying a Socket.IO "event" (2).
pub const SOCKET_IO_EVENT_PREFIX: &str = "42";

/// Builds the wire representation of an event.
///
/// Implementations must be `Send + Sync` so a [`Connection`](crate::Connection)
/// can move between threads.
pub trait EventFraming: Send + Sync {
    /// Serialize `action` and `payload` into a message body.
    fn frame_event(&self, action: &str, payload: &Value) -> WsResult<Vec<u8>>;
}

/// Socket.IO events: `42["action",payload]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketIoFraming;

impl EventFraming for SocketIoFraming {
    fn frame_event(&self, action: &str, payload: &Value) -> WsResult<Vec<u8>> {
        let body = serde_json::to_vec(&(action, payload))
            .map_err(|e| WsError::encode_failed(e.to_string()))?;

        let mut message = Vec::with_capacity(SOCKET_IO_EVENT_PREFIX.len() + body.len());
        message.extend_from_slice(SOCKET_IO_EVENT_PREFIX.as_bytes());
        message.extend_from_slice(&body);
        Ok(message)
    }
}

/// Plain JSON envelopes: `{"event":"action","data":payload}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainJsonFraming;

impl EventFraming for PlainJsonFraming {
    fn frame_event(&self, action: &str, payload: &Value) -> WsResult<Vec<u8>> {
        serde_json::to_vec(&json!({ "event": action, "data": payload }))
            .map_err(|e| WsError::encode_failed(e.to_string()))
    }
}
