//! Blocking WebSocket client connection.
//!
//! This module provides the [`Connection`] type, which owns one transport
//! stream and keeps it authenticated: every operation first makes sure a
//! handshake exists and is younger than the configured expiry, renegotiating
//! on a fresh stream when it is not.

use std::fmt;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::config::ClientConfig;
use crate::error::{WsError, WsResult};
use crate::frame::{self, Frame, Opcode};
use crate::framing::{EventFraming, SocketIoFraming};
use crate::handshake;
use crate::transport::{Connector, TcpConnector, Transport};

/// Handshake state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No authenticated stream.
    Disconnected,
    /// A handshake succeeded at `established_at`.
    Connected {
        /// When the handshake completed.
        established_at: Instant,
    },
}

impl ConnectionState {
    /// Check whether the handshake is still valid at `now` under `expiry`.
    ///
    /// A handshake is stale once `now - established_at >= expiry`.
    pub fn is_fresh(&self, now: Instant, expiry: Duration) -> bool {
        match self {
            Self::Disconnected => false,
            Self::Connected { established_at } => {
                now.saturating_duration_since(*established_at) < expiry
            }
        }
    }
}

/// A WebSocket client connection.
///
/// The API is blocking and takes `&mut self`, so at most one handshake is
/// in flight per connection. Share a connection across threads only behind
/// external synchronization.
///
/// # Example
///
/// ```no_run
/// use sockwire::Connection;
///
/// # fn main() -> sockwire::WsResult<()> {
/// let mut conn = Connection::new("127.0.0.1", 3000);
/// conn.send(&serde_json::json!({ "msg": "hello" }))?;
/// conn.emit("msg", &"hello")?;
/// let reply = conn.receive()?;
/// println!("{}", String::from_utf8_lossy(&reply));
/// conn.close();
/// # Ok(())
/// # }
/// ```
pub struct Connection<C = TcpConnector, R = StdRng>
where
    C: Connector,
    R: RngCore,
{
    host: String,
    port: u16,
    config: ClientConfig,
    connector: C,
    rng: R,
    framing: Box<dyn EventFraming>,
    stream: Option<C::Stream>,
    state: ConnectionState,
}

impl Connection {
    /// Create a TCP connection to `host:port` with default configuration.
    ///
    /// Nothing is opened until the first operation.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_config(host, port, ClientConfig::default())
    }

    /// Create a TCP connection to `host:port` with the given configuration.
    pub fn with_config(host: impl Into<String>, port: u16, config: ClientConfig) -> Self {
        Self::with_connector(host, port, config, TcpConnector, StdRng::from_os_rng())
    }
}

impl<C, R> Connection<C, R>
where
    C: Connector,
    R: RngCore,
{
    /// Create a connection that opens streams through `connector` and draws
    /// handshake keys and masking keys from `rng`.
    pub fn with_connector(
        host: impl Into<String>,
        port: u16,
        config: ClientConfig,
        connector: C,
        rng: R,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            config,
            connector,
            rng,
            framing: Box::new(SocketIoFraming),
            stream: None,
            state: ConnectionState::Disconnected,
        }
    }

    /// Replace the event framing used by [`emit`](Self::emit).
    pub fn with_framing(mut self, framing: impl EventFraming + 'static) -> Self {
        self.framing = Box::new(framing);
        self
    }

    /// Get the target host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the target port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the connection configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the current handshake state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Check if a handshake has completed and not been closed since.
    ///
    /// This does not apply the expiry policy.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected { .. })
    }

    /// Make sure a handshake exists and has not expired.
    ///
    /// An expired handshake closes the current stream and negotiates a new
    /// one. Errors are returned as-is; nothing is retried.
    #[instrument(skip(self), fields(host = %self.host, port = self.port))]
    pub fn ensure_connected(&mut self) -> WsResult<()> {
        let now = Instant::now();
        if self.state.is_fresh(now, self.config.handshake_expiry) {
            return Ok(());
        }

        if let ConnectionState::Connected { established_at } = self.state {
            debug!(
                age_ms = now.saturating_duration_since(established_at).as_millis() as u64,
                "handshake expired, reconnecting"
            );
            self.close();
        }

        self.handshake()
    }

    fn handshake(&mut self) -> WsResult<()> {
        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.connector.connect(&self.host, self.port, &self.config)?,
        };

        match handshake::perform(&mut stream, &self.host, self.port, &self.config, &mut self.rng) {
            Ok(established_at) => {
                self.stream = Some(stream);
                self.state = ConnectionState::Connected { established_at };
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    /// Encode `payload` as one frame of type `opcode` and write it.
    ///
    /// Returns the number of bytes written.
    #[instrument(skip(self, payload), fields(host = %self.host, len = payload.len()))]
    pub fn send_frame(&mut self, payload: &[u8], opcode: Opcode) -> WsResult<usize> {
        self.ensure_connected()?;
        self.write_frame(payload, opcode)
    }

    /// Send a text message.
    pub fn send_text(&mut self, text: &str) -> WsResult<usize> {
        self.send_frame(text.as_bytes(), Opcode::Text)
    }

    /// Send a binary message.
    pub fn send_binary(&mut self, data: &[u8]) -> WsResult<usize> {
        self.send_frame(data, Opcode::Binary)
    }

    /// Serialize `payload` as JSON and send it as a text message.
    #[instrument(skip(self, payload), fields(host = %self.host))]
    pub fn send<T>(&mut self, payload: &T) -> WsResult<usize>
    where
        T: Serialize + ?Sized,
    {
        self.ensure_connected()?;
        let body =
            serde_json::to_vec(payload).map_err(|e| WsError::encode_failed(e.to_string()))?;
        self.write_frame(&body, Opcode::Text)
    }

    /// Send `payload` as the event `action`, framed by the configured [`EventFraming`].
    ///
    /// With the default Socket.IO framing the message is `42["action",payload]`.
    #[instrument(skip(self, payload), fields(host = %self.host))]
    pub fn emit<T>(&mut self, action: &str, payload: &T) -> WsResult<usize>
    where
        T: Serialize + ?Sized,
    {
        self.ensure_connected()?;
        let value =
            serde_json::to_value(payload).map_err(|e| WsError::encode_failed(e.to_string()))?;
        let body = self.framing.frame_event(action, &value)?;
        self.write_frame(&body, Opcode::Text)
    }

    /// Read one data frame and return its payload.
    ///
    /// Control and fragmented frames are reported as
    /// [`WsError::UnsupportedFrameType`].
    #[instrument(skip(self), fields(host = %self.host))]
    pub fn receive(&mut self) -> WsResult<Vec<u8>> {
        self.ensure_connected()?;
        let bytes = self.read_frame_bytes()?;
        frame::decode(&bytes)
    }

    /// Read one frame of any known type, including Close, Ping and Pong.
    #[instrument(skip(self), fields(host = %self.host))]
    pub fn receive_frame(&mut self) -> WsResult<Frame> {
        self.ensure_connected()?;
        let bytes = self.read_frame_bytes()?;
        frame::decode_frame(&bytes)
    }

    /// Read one data frame and deserialize its payload as JSON.
    pub fn receive_json<T: DeserializeOwned>(&mut self) -> WsResult<T> {
        let payload = self.receive()?;
        serde_json::from_slice(&payload).map_err(|e| WsError::decode_failed(e.to_string()))
    }

    /// Close the stream and forget the handshake.
    ///
    /// Closing is best-effort: errors from the transport are logged and
    /// dropped, and the state is always [`ConnectionState::Disconnected`]
    /// afterwards.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close() {
                debug!(error = %e, "ignoring error while closing stream");
            }
        }
        self.state = ConnectionState::Disconnected;
    }

    fn stream_mut(&mut self) -> WsResult<&mut C::Stream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no open stream").into())
    }

    fn write_frame(&mut self, payload: &[u8], opcode: Opcode) -> WsResult<usize> {
        let bytes = frame::encode(payload, opcode, self.config.mask_frames, &mut self.rng)?;
        let stream = self.stream_mut()?;
        stream.write_all(&bytes)?;
        stream.flush()?;
        Ok(bytes.len())
    }

    /// Read exactly one frame: its header, then the bytes the header
    /// announces. Anything the peer sent after the frame stays on the stream.
    fn read_frame_bytes(&mut self) -> WsResult<Vec<u8>> {
        let limit = self.config.receive_buffer_size;
        let stream = self.stream_mut()?;

        let mut start = [0u8; 2];
        let n = stream.read(&mut start)?;
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by peer",
            )
            .into());
        }
        let mut buf = start[..n].to_vec();
        fill_to(stream, &mut buf, 2)?;

        let header_len = frame::header_len([buf[0], buf[1]]);
        fill_to(stream, &mut buf, header_len)?;
        let total = frame::frame_len(&buf)?
            .ok_or_else(|| WsError::malformed_frame("incomplete frame header"))?;
        if total > limit {
            return Err(WsError::malformed_frame(format!(
                "frame of {total} bytes exceeds the {limit}-byte receive buffer"
            )));
        }
        fill_to(stream, &mut buf, total)?;

        trace!(bytes = total, "read frame bytes");
        Ok(buf)
    }
}

/// Grow `buf` to `len` bytes read from `stream`.
fn fill_to<S: Read + ?Sized>(stream: &mut S, buf: &mut Vec<u8>, len: usize) -> WsResult<()> {
    let mut filled = buf.len();
    if filled >= len {
        return Ok(());
    }
    buf.resize(len, 0);
    while filled < len {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(WsError::malformed_frame(format!(
                    "connection closed after {filled} of {len} frame bytes"
                )))
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

impl<C, R> fmt::Debug for Connection<C, R>
where
    C: Connector,
    R: RngCore,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
