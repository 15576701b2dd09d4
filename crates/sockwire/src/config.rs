//! WebSocket client configuration.
//!
//! This module defines the options that shape the upgrade request, the
//! handshake expiry policy, read buffer bounds and socket timeouts.

use std::time::Duration;

/// Default request target for the upgrade request (Engine.IO v2 WebSocket transport).
pub const DEFAULT_REQUEST_PATH: &str = "/socket.io/?EIO=2&transport=websocket";

/// Configuration for a client connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// How long a handshake stays valid before the next operation renegotiates (default: 30 seconds).
    pub handshake_expiry: Duration,
    /// Request target of the upgrade request.
    pub request_path: String,
    /// Value sent in the `Sec-WebSocket-Version` header (default: empty).
    pub websocket_version: String,
    /// Value sent in the `Origin` header (default: `*`).
    pub origin: String,
    /// Maximum bytes read for the handshake response (default: 1024).
    pub handshake_buffer_size: usize,
    /// Maximum bytes read for one received frame (default: 1,000,000).
    pub receive_buffer_size: usize,
    /// Whether outgoing frames are masked (default: true).
    pub mask_frames: bool,
    /// Timeout for opening the TCP stream (default: none).
    pub connect_timeout: Option<Duration>,
    /// Socket read timeout (default: none, reads block).
    pub read_timeout: Option<Duration>,
    /// Socket write timeout (default: none, writes block).
    pub write_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            handshake_expiry: Duration::from_secs(30),
            request_path: DEFAULT_REQUEST_PATH.to_string(),
            websocket_version: String::new(),
            origin: "*".to_string(),
            handshake_buffer_size: 1024,
            receive_buffer_size: 1_000_000,
            mask_frames: true,
            connect_timeout: None,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Create a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handshake expiry.
    pub fn handshake_expiry(mut self, expiry: Duration) -> Self {
        self.handshake_expiry = expiry;
        self
    }

    /// Set the upgrade request target.
    pub fn request_path(mut self, path: impl Into<String>) -> Self {
        self.request_path = path.into();
        self
    }

    /// Set the `Sec-WebSocket-Version` header value.
    pub fn websocket_version(mut self, version: impl Into<String>) -> Self {
        self.websocket_version = version.into();
        self
    }

    /// Set the `Origin` header value.
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set the handshake response buffer size.
    pub fn handshake_buffer_size(mut self, size: usize) -> Self {
        self.handshake_buffer_size = size;
        self
    }

    /// Set the receive buffer size.
    pub fn receive_buffer_size(mut self, size: usize) -> Self {
        self.receive_buffer_size = size;
        self
    }

    /// Set whether outgoing frames are masked.
    pub fn mask_frames(mut self, mask: bool) -> Self {
        self.mask_frames = mask;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the socket read timeout.
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the socket write timeout.
    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }
}
