//! Byte-stream transport used underneath a [`Connection`](crate::Connection).
//!
//! The client only needs a blocking, bidirectional byte stream that it can
//! close. [`TcpConnector`] opens plain TCP streams; tests plug in in-memory
//! doubles through the same [`Connector`] seam.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use tracing::{debug, instrument};

use crate::config::ClientConfig;

/// A blocking byte stream that can be closed explicitly.
pub trait Transport: Read + Write {
    /// Close the stream. Further reads and writes fail or return EOF.
    fn close(&mut self) -> io::Result<()>;
}

/// Opens transports to a host and port.
pub trait Connector {
    /// The stream type produced by this connector.
    type Stream: Transport;

    /// Open a stream to `host:port`, applying the socket options in `config`.
    fn connect(&self, host: &str, port: u16, config: &ClientConfig) -> io::Result<Self::Stream>;
}

/// A TCP stream transport.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Wrap an already connected stream.
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Get the underlying stream.
    pub fn get_ref(&self) -> &TcpStream {
        &self.stream
    }
}

impl Read for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TcpTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl Transport for TcpTransport {
    fn close(&mut self) -> io::Result<()> {
        self.stream.shutdown(Shutdown::Both)
    }
}

/// Connector that opens [`TcpTransport`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpTransport;

    #[instrument(skip(self, config))]
    fn connect(&self, host: &str, port: u16, config: &ClientConfig) -> io::Result<TcpTransport> {
        let stream = match config.connect_timeout {
            Some(timeout) => connect_with_timeout(host, port, timeout)?,
            None => TcpStream::connect((host, port))?,
        };

        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        stream.set_nodelay(true)?;

        debug!(peer = ?stream.peer_addr().ok(), "TCP stream opened");
        Ok(TcpTransport::new(stream))
    }
}

/// Try every resolved address in turn, returning the last error if none connect.
fn connect_with_timeout(
    host: &str,
    port: u16,
    timeout: std::time::Duration,
) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no addresses resolved for {host}:{port}"),
        )
    }))
}
