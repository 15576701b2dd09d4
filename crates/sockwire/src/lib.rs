//! Minimal blocking WebSocket client.
//!
//! This crate implements the client side of RFC 6455 over a plain TCP
//! stream: the HTTP/1.1 upgrade handshake, single-frame encoding and
//! decoding, and a [`Connection`] that keeps its handshake fresh.
//!
//! # Features
//!
//! - **Frame codec** for Text, Binary, Close, Ping and Pong frames with all
//!   three payload length classes and client masking
//! - **Handshake** with `Sec-WebSocket-Accept` verification
//! - **Handshake expiry**: a handshake older than 30 seconds (configurable)
//!   is renegotiated on a new stream before the next operation
//! - **JSON helpers** for sending and receiving serde values
//! - **Event framing** for Socket.IO style `42["action",payload]` messages
//!
//! # Example
//!
//! ```no_run
//! use sockwire::{ClientConfig, Connection};
//! use std::time::Duration;
//!
//! # fn main() -> sockwire::WsResult<()> {
//! let config = ClientConfig::new().read_timeout(Some(Duration::from_secs(5)));
//! let mut conn = Connection::with_config("127.0.0.1", 3000, config);
//!
//! conn.emit("chat", &serde_json::json!({ "text": "hi" }))?;
//! match conn.receive() {
//!     Ok(payload) => println!("{}", String::from_utf8_lossy(&payload)),
//!     Err(e) if e.is_ignorable() => {}
//!     Err(e) => return Err(e),
//! }
//!
//! conn.close();
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Connection::send/emit/receive
//!       │
//!       ▼
//! ensure_connected() ── stale or missing? ──► Connector::connect()
//!       │                                          │
//!       │                                          ▼
//!       │                                   handshake::perform()
//!       ▼
//! frame::encode() / frame::decode() ──► Transport (Read + Write)
//! ```
//!
//! # Limitations
//!
//! Fragmented messages, extensions and subprotocols are not supported.
//! Control frames are never answered automatically; use
//! [`Connection::receive_frame`] to observe them.

pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod framing;
pub mod handshake;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use config::ClientConfig;
pub use connection::{Connection, ConnectionState};
pub use error::{WsError, WsResult};
pub use frame::{Frame, Opcode};
pub use framing::{EventFraming, PlainJsonFraming, SocketIoFraming};
pub use handshake::compute_accept_key;
pub use transport::{Connector, TcpConnector, TcpTransport, Transport};
