//! In-memory transport doubles for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

use rand::RngCore;

use crate::config::ClientConfig;
use crate::handshake::compute_accept_key;
use crate::transport::{Connector, Transport};

/// An RNG that cycles through a fixed byte sequence.
pub(crate) struct FixedBytes {
    bytes: Vec<u8>,
    pos: usize,
}

impl FixedBytes {
    pub(crate) fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            pos: 0,
        }
    }
}

impl RngCore for FixedBytes {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest {
            *byte = self.bytes[self.pos % self.bytes.len()];
            self.pos += 1;
        }
    }
}

/// Shared record of everything the doubles saw.
pub(crate) struct MockState {
    /// Answer upgrade requests with the correct accept value.
    pub auto_accept: bool,
    /// Answer upgrade requests with this accept value instead.
    pub accept_override: Option<String>,
    /// Fail every connect attempt.
    pub refuse_connect: bool,
    pub connects: usize,
    pub handshakes: usize,
    pub closes: usize,
    /// Each `write` call, in order.
    pub written: Vec<Vec<u8>>,
    /// Chunks returned by successive reads.
    pub inbound: VecDeque<Vec<u8>>,
}

impl MockState {
    pub(crate) fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            auto_accept: true,
            accept_override: None,
            refuse_connect: false,
            connects: 0,
            handshakes: 0,
            closes: 0,
            written: Vec::new(),
            inbound: VecDeque::new(),
        }))
    }

    pub(crate) fn written_text(&self) -> String {
        self.written
            .iter()
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect()
    }

    /// Writes that were not upgrade requests.
    pub(crate) fn frames(&self) -> Vec<Vec<u8>> {
        self.written
            .iter()
            .filter(|chunk| !chunk.starts_with(b"GET "))
            .cloned()
            .collect()
    }

    fn answer_upgrade(&mut self, request: &[u8]) {
        self.handshakes += 1;
        if !self.auto_accept {
            return;
        }
        let request = String::from_utf8_lossy(request);
        let key = request
            .lines()
            .find_map(|line| line.strip_prefix("Sec-WebSocket-Key: "))
            .unwrap_or_default();
        let accept = self
            .accept_override
            .clone()
            .unwrap_or_else(|| compute_accept_key(key));
        let response = format!(
            "HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: {accept}\r\n\r\n"
        );
        self.inbound.push_front(response.into_bytes());
    }
}

/// A transport backed by [`MockState`].
pub(crate) struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

impl MockTransport {
    pub(crate) fn new(state: Rc<RefCell<MockState>>) -> Self {
        Self { state }
    }
}

impl Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        let Some(mut chunk) = state.inbound.pop_front() else {
            return Ok(0);
        };
        if chunk.len() > buf.len() {
            let rest = chunk.split_off(buf.len());
            state.inbound.push_front(rest);
        }
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

impl Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.borrow_mut();
        if buf.starts_with(b"GET ") {
            state.answer_upgrade(buf);
        }
        state.written.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for MockTransport {
    fn close(&mut self) -> io::Result<()> {
        self.state.borrow_mut().closes += 1;
        Ok(())
    }
}

/// Connector handing out [`MockTransport`]s over one shared state.
pub(crate) struct MockConnector {
    state: Rc<RefCell<MockState>>,
}

impl MockConnector {
    pub(crate) fn new(state: Rc<RefCell<MockState>>) -> Self {
        Self { state }
    }
}

impl Connector for MockConnector {
    type Stream = MockTransport;

    fn connect(&self, _host: &str, _port: u16, _config: &ClientConfig) -> io::Result<MockTransport> {
        let mut state = self.state.borrow_mut();
        if state.refuse_connect {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        }
        state.connects += 1;
        Ok(MockTransport::new(Rc::clone(&self.state)))
    }
}
