//! Client side of the WebSocket upgrade handshake (RFC 6455 Section 4).
//!
//! The client writes a fixed-order HTTP/1.1 upgrade request, reads the
//! response head up to the blank line that ends it (never more than
//! `handshake_buffer_size` bytes), and verifies the `Sec-WebSocket-Accept`
//! header against the key it sent. Frames the server sends right behind the
//! `101` response stay on the stream for the first receive.
//!
//! A request looks like this:
//!
//! ```http
//! GET /socket.io/?EIO=2&transport=websocket HTTP/1.1
//! Host: http://example.com:3000
//! Connection: Upgrade
//! Upgrade: WebSocket
//! Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==
//! Sec-WebSocket-Version:
//! Origin: *
//! ```

use std::io;
use std::time::Instant;

use base64::Engine;
use rand::RngCore;
use sha1::{Digest, Sha1};
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{WsError, WsResult};
use crate::transport::Transport;

/// The WebSocket magic GUID used in the handshake.
pub const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Number of random bytes in a `Sec-WebSocket-Key`.
pub const KEY_LEN: usize = 16;

const ACCEPT_HEADER: &str = "Sec-WebSocket-Accept:";

/// Compute the Sec-WebSocket-Accept value for a client key.
pub fn compute_accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    let result = hasher.finalize();
    base64::engine::general_purpose::STANDARD.encode(result)
}

/// Generate a fresh base64-encoded handshake key.
pub fn generate_key<R>(rng: &mut R) -> String
where
    R: RngCore + ?Sized,
{
    let mut key = [0u8; KEY_LEN];
    rng.fill_bytes(&mut key);
    base64::engine::general_purpose::STANDARD.encode(key)
}

/// Build the upgrade request.
///
/// Header names and their order are fixed; servers that parse headers
/// positionally depend on it.
pub fn build_request(host: &str, port: u16, key: &str, config: &ClientConfig) -> String {
    let lines = [
        format!("GET {} HTTP/1.1", config.request_path),
        format!("Host: http://{host}:{port}"),
        "Connection: Upgrade".to_string(),
        "Upgrade: WebSocket".to_string(),
        format!("Sec-WebSocket-Key: {key}"),
        format!("Sec-WebSocket-Version:{}", version_value(&config.websocket_version)),
        format!("Origin: {}", config.origin),
    ];
    let mut request = lines.join("\r\n");
    request.push_str("\r\n\r\n");
    request
}

/// An empty version keeps the bare `Sec-WebSocket-Version:` line.
fn version_value(version: &str) -> String {
    if version.is_empty() {
        String::new()
    } else {
        format!(" {version}")
    }
}

/// Find the first `Sec-WebSocket-Accept` value in a raw response.
///
/// Matching is line-oriented and case-sensitive; the value is trimmed.
pub fn parse_accept_header(response: &str) -> Option<&str> {
    response.lines().find_map(|line| {
        line.find(ACCEPT_HEADER)
            .map(|idx| line[idx + ACCEPT_HEADER.len()..].trim())
    })
}

/// Run the handshake over an open stream with a freshly generated key.
///
/// Returns the instant the connection was established.
///
/// # Errors
///
/// - [`WsError::HandshakeRejected`] if the accept value does not match.
/// - [`WsError::HandshakeMalformedResponse`] if no accept header is present.
/// - [`WsError::Io`] if writing the request or reading the response fails.
///
/// The stream is closed on rejection and on a malformed response.
pub fn perform<S, R>(
    stream: &mut S,
    host: &str,
    port: u16,
    config: &ClientConfig,
    rng: &mut R,
) -> WsResult<Instant>
where
    S: Transport + ?Sized,
    R: RngCore + ?Sized,
{
    let key = generate_key(rng);
    perform_with_key(stream, host, port, config, &key)
}

/// Run the handshake with a caller-supplied key.
///
/// # Errors
///
/// Same as [`perform`].
#[instrument(skip(stream, config, key))]
pub fn perform_with_key<S>(
    stream: &mut S,
    host: &str,
    port: u16,
    config: &ClientConfig,
    key: &str,
) -> WsResult<Instant>
where
    S: Transport + ?Sized,
{
    let request = build_request(host, port, key, config);
    stream.write_all(request.as_bytes())?;
    stream.flush()?;

    let head = read_response_head(stream, config.handshake_buffer_size)?;
    let n = head.len();
    let response = String::from_utf8_lossy(&head);

    let Some(actual) = parse_accept_header(&response) else {
        warn!(response_len = n, "handshake response has no Sec-WebSocket-Accept header");
        close_quietly(stream);
        return Err(WsError::malformed_response(if n == 0 {
            "connection closed before a response arrived".to_string()
        } else {
            "missing Sec-WebSocket-Accept header".to_string()
        }));
    };

    let expected = compute_accept_key(key);
    if actual != expected {
        warn!(%expected, %actual, "handshake rejected");
        let err = WsError::handshake_rejected(expected, actual);
        close_quietly(stream);
        return Err(err);
    }

    debug!("handshake accepted");
    Ok(Instant::now())
}

/// Read the response head one byte at a time until `\r\n\r\n`, EOF, or
/// `limit` bytes.
fn read_response_head<S>(stream: &mut S, limit: usize) -> WsResult<Vec<u8>>
where
    S: Transport + ?Sized,
{
    let mut head = Vec::with_capacity(limit.min(1024));
    let mut byte = [0u8; 1];
    while head.len() < limit && !head.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => head.push(byte[0]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(head)
}

fn close_quietly<S: Transport + ?Sized>(stream: &mut S) {
    if let Err(e) = stream.close() {
        debug!(error = %e, "ignoring error while closing stream");
    }
}
