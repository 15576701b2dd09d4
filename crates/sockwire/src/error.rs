//! Error types for WebSocket client operations.
//!
//! This module defines the errors that can occur while negotiating the
//! upgrade handshake, encoding and decoding frames, and moving bytes over
//! the transport.

use thiserror::Error;

/// Result type for WebSocket operations.
pub type WsResult<T> = Result<T, WsError>;

/// Errors that can occur during WebSocket client operations.
#[derive(Debug, Error)]
pub enum WsError {
    /// The server answered the upgrade with a wrong `Sec-WebSocket-Accept` value.
    #[error("handshake rejected: expected accept {expected:?}, got {actual:?}")]
    HandshakeRejected {
        /// The accept value computed from our key.
        expected: String,
        /// The accept value the server sent.
        actual: String,
    },

    /// The upgrade response did not carry a usable `Sec-WebSocket-Accept` header.
    #[error("malformed handshake response: {0}")]
    HandshakeMalformedResponse(String),

    /// The payload length cannot be represented in a frame header.
    #[error("payload too large: {size} bytes exceeds the 63-bit frame length limit")]
    PayloadTooLarge {
        /// The offending payload length.
        size: u64,
    },

    /// A received frame is truncated or its length field disagrees with its body.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// A received frame is fragmented or is not a data frame.
    #[error("unsupported frame type: opcode 0x{opcode:X} (fin: {fin})")]
    UnsupportedFrameType {
        /// The raw 4-bit opcode.
        opcode: u8,
        /// Whether the FIN bit was set.
        fin: bool,
    },

    /// The application payload could not be serialized.
    #[error("failed to encode payload: {0}")]
    EncodeFailed(String),

    /// A received payload could not be deserialized.
    #[error("failed to decode payload: {0}")]
    DecodeFailed(String),

    /// I/O error from the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WsError {
    /// Create a new handshake rejected error.
    pub fn handshake_rejected(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::HandshakeRejected {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a new malformed handshake response error.
    pub fn malformed_response(reason: impl Into<String>) -> Self {
        Self::HandshakeMalformedResponse(reason.into())
    }

    /// Create a new malformed frame error.
    pub fn malformed_frame(reason: impl Into<String>) -> Self {
        Self::MalformedFrame(reason.into())
    }

    /// Create a new encode failed error.
    pub fn encode_failed(reason: impl Into<String>) -> Self {
        Self::EncodeFailed(reason.into())
    }

    /// Create a new decode failed error.
    pub fn decode_failed(reason: impl Into<String>) -> Self {
        Self::DecodeFailed(reason.into())
    }

    /// Check if this error leaves the connection unusable.
    ///
    /// Callers should close the connection after a fatal error; the next
    /// operation will negotiate a fresh handshake.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::HandshakeRejected { .. }
                | Self::HandshakeMalformedResponse(_)
                | Self::MalformedFrame(_)
                | Self::Io(_)
        )
    }

    /// Check if this error only reports a frame the client does not handle.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::UnsupportedFrameType { .. })
    }
}
