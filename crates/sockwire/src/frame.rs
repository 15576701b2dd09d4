//! WebSocket frame codec (RFC 6455 Section 5, "hybi10" framing).
//!
//! Encoding and decoding are pure functions over byte slices: nothing here
//! touches the transport or the connection state.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! +-+-+-+-+-------+-+-------------+ - - - - - - - - - - - - - - - +
//! |     Extended payload length continued, if payload len == 127  |
//! + - - - - - - - - - - - - - - - +-------------------------------+
//! |                               |Masking-key, if MASK set to 1  |
//! +-------------------------------+-------------------------------+
//! | Masking-key (continued)       |          Payload Data         |
//! +-------------------------------- - - - - - - - - - - - - - - - +
//! ```
//!
//! Fragmented messages and control-frame handling are out of scope: the
//! decoder reports them as [`WsError::UnsupportedFrameType`].

use rand::RngCore;
use tracing::trace;

use crate::error::{WsError, WsResult};

const FIN_BIT: u8 = 0x80;
const MASK_BIT: u8 = 0x80;
const OPCODE_MASK: u8 = 0x0F;
const LEN_MASK: u8 = 0x7F;

/// Second-byte marker for a 16-bit extended length.
const LEN_16: u8 = 126;
/// Second-byte marker for a 64-bit extended length.
const LEN_64: u8 = 127;

/// Largest payload a frame can describe: the top bit of the 64-bit length must be 0.
pub const MAX_PAYLOAD_LEN: u64 = u64::MAX >> 1;

/// Frame type, stored as the complete first header byte (FIN bit set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Text data frame.
    Text = 0x81,
    /// Binary data frame.
    Binary = 0x82,
    /// Connection close control frame.
    Close = 0x88,
    /// Ping control frame.
    Ping = 0x89,
    /// Pong control frame.
    Pong = 0x8A,
}

impl Opcode {
    /// The first header byte for a final frame of this type.
    pub fn header_byte(self) -> u8 {
        self as u8
    }

    /// The 4-bit opcode value.
    pub fn code(self) -> u8 {
        self as u8 & OPCODE_MASK
    }

    /// Parse a 4-bit opcode value. Continuation and reserved values yield `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x1 => Some(Self::Text),
            0x2 => Some(Self::Binary),
            0x8 => Some(Self::Close),
            0x9 => Some(Self::Ping),
            0xA => Some(Self::Pong),
            _ => None,
        }
    }

    /// Returns true for Close, Ping and Pong.
    pub fn is_control(self) -> bool {
        matches!(self, Self::Close | Self::Ping | Self::Pong)
    }
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame type.
    pub opcode: Opcode,
    /// Unmasked payload bytes.
    pub payload: Vec<u8>,
    /// Whether the frame arrived masked.
    pub masked: bool,
}

impl Frame {
    /// Returns the payload as UTF-8 text, if it is valid.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// XOR `buf` with the 4-byte masking key, starting at key offset 0.
///
/// Applying the same key twice restores the original bytes.
pub fn apply_mask(buf: &mut [u8], key: [u8; 4]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte ^= key[i % 4];
    }
}

/// Build a frame header for a payload of `len` bytes.
///
/// The returned bytes include the masking key when `mask` is set.
///
/// # Errors
///
/// Returns [`WsError::PayloadTooLarge`] when `len` needs the top bit of the
/// 64-bit length field.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_header(len: u64, opcode: Opcode, mask: Option<[u8; 4]>) -> WsResult<Vec<u8>> {
    if len > MAX_PAYLOAD_LEN {
        return Err(WsError::PayloadTooLarge { size: len });
    }

    let mask_bit = if mask.is_some() { MASK_BIT } else { 0 };
    let mut header = Vec::with_capacity(14);
    header.push(opcode.header_byte());

    match len {
        0..=125 => header.push(len as u8 | mask_bit),
        126..=0xFFFF => {
            header.push(LEN_16 | mask_bit);
            header.extend_from_slice(&(len as u16).to_be_bytes());
        }
        _ => {
            header.push(LEN_64 | mask_bit);
            header.extend_from_slice(&len.to_be_bytes());
        }
    }

    if let Some(key) = mask {
        header.extend_from_slice(&key);
    }

    Ok(header)
}

/// Encode a complete frame, drawing the masking key from `rng` when `masked`.
///
/// # Errors
///
/// Returns [`WsError::PayloadTooLarge`] if the payload length cannot be
/// represented; nothing is produced in that case.
pub fn encode<R>(payload: &[u8], opcode: Opcode, masked: bool, rng: &mut R) -> WsResult<Vec<u8>>
where
    R: RngCore + ?Sized,
{
    let mask = masked.then(|| {
        let mut key = [0u8; 4];
        rng.fill_bytes(&mut key);
        key
    });
    encode_with_mask(payload, opcode, mask)
}

/// Encode a complete frame with an explicit masking key.
///
/// # Errors
///
/// Returns [`WsError::PayloadTooLarge`] if the payload length cannot be
/// represented.
pub fn encode_with_mask(
    payload: &[u8],
    opcode: Opcode,
    mask: Option<[u8; 4]>,
) -> WsResult<Vec<u8>> {
    let mut frame = encode_header(payload.len() as u64, opcode, mask)?;
    let body_start = frame.len();
    frame.extend_from_slice(payload);

    if let Some(key) = mask {
        apply_mask(&mut frame[body_start..], key);
    }

    trace!(
        opcode = ?opcode,
        payload_len = payload.len(),
        frame_len = frame.len(),
        masked = mask.is_some(),
        "encoded frame"
    );
    Ok(frame)
}

/// Parsed fixed part of a frame.
#[derive(Debug, Clone, Copy)]
struct FrameHeader {
    fin: bool,
    opcode: u8,
    mask: Option<[u8; 4]>,
    payload_len: u64,
    header_len: usize,
}

/// Parse the header at the start of `bytes`.
///
/// Returns `Ok(None)` when `bytes` ends before the header does.
fn parse_header(bytes: &[u8]) -> WsResult<Option<FrameHeader>> {
    let [first, second, rest @ ..] = bytes else {
        return Ok(None);
    };

    let fin = first & FIN_BIT != 0;
    let opcode = first & OPCODE_MASK;
    let masked = second & MASK_BIT != 0;

    let (payload_len, rest) = match second & LEN_MASK {
        LEN_16 => {
            let Some((len, rest)) = rest.split_first_chunk::<2>() else {
                return Ok(None);
            };
            (u64::from(u16::from_be_bytes(*len)), rest)
        }
        LEN_64 => {
            let Some((len, rest)) = rest.split_first_chunk::<8>() else {
                return Ok(None);
            };
            let len = u64::from_be_bytes(*len);
            if len > MAX_PAYLOAD_LEN {
                return Err(WsError::malformed_frame(
                    "64-bit payload length has its most significant bit set",
                ));
            }
            (len, rest)
        }
        len => (u64::from(len), rest),
    };

    let mask = if masked {
        let Some((key, _)) = rest.split_first_chunk::<4>() else {
            return Ok(None);
        };
        Some(*key)
    } else {
        None
    };

    Ok(Some(FrameHeader {
        fin,
        opcode,
        mask,
        payload_len,
        header_len: header_len([*first, *second]),
    }))
}

/// Length of the whole header (extended length and masking key included)
/// announced by the first two bytes of a frame.
pub fn header_len(first_two: [u8; 2]) -> usize {
    let second = first_two[1];
    let extended = match second & LEN_MASK {
        LEN_16 => 2,
        LEN_64 => 8,
        _ => 0,
    };
    let mask = if second & MASK_BIT != 0 { 4 } else { 0 };
    2 + extended + mask
}

/// Total length in bytes of the frame starting at `bytes[0]`, as announced by its header.
///
/// Returns `Ok(None)` if the header itself is not complete yet.
///
/// # Errors
///
/// Returns [`WsError::MalformedFrame`] if the announced length is invalid or
/// does not fit in memory.
pub fn frame_len(bytes: &[u8]) -> WsResult<Option<usize>> {
    let Some(header) = parse_header(bytes)? else {
        return Ok(None);
    };
    usize::try_from(header.payload_len)
        .ok()
        .and_then(|len| len.checked_add(header.header_len))
        .map(Some)
        .ok_or_else(|| WsError::malformed_frame("announced payload length does not fit in memory"))
}

/// Decode exactly one complete, final frame of any known type.
///
/// # Errors
///
/// - [`WsError::MalformedFrame`] if `bytes` is shorter than the header or
///   the remaining byte count differs from the length field.
/// - [`WsError::UnsupportedFrameType`] if FIN is unset or the opcode is a
///   continuation or reserved value.
pub fn decode_frame(bytes: &[u8]) -> WsResult<Frame> {
    let header = parse_header(bytes)?.ok_or_else(|| {
        WsError::malformed_frame(format!(
            "{} bytes is shorter than the frame header",
            bytes.len()
        ))
    })?;

    if !header.fin {
        return Err(WsError::UnsupportedFrameType {
            opcode: header.opcode,
            fin: false,
        });
    }

    let opcode = Opcode::from_code(header.opcode).ok_or(WsError::UnsupportedFrameType {
        opcode: header.opcode,
        fin: true,
    })?;

    let body = &bytes[header.header_len..];
    if body.len() as u64 != header.payload_len {
        return Err(WsError::malformed_frame(format!(
            "length field announces {} payload bytes, frame carries {}",
            header.payload_len,
            body.len()
        )));
    }

    let mut payload = body.to_vec();
    if let Some(key) = header.mask {
        apply_mask(&mut payload, key);
    }

    trace!(opcode = ?opcode, payload_len = payload.len(), masked = header.mask.is_some(), "decoded frame");
    Ok(Frame {
        opcode,
        payload,
        masked: header.mask.is_some(),
    })
}

/// Decode one data frame and return its payload.
///
/// # Errors
///
/// Everything [`decode_frame`] reports, plus
/// [`WsError::UnsupportedFrameType`] for Close, Ping and Pong frames.
pub fn decode(bytes: &[u8]) -> WsResult<Vec<u8>> {
    let frame = decode_frame(bytes)?;
    if frame.opcode.is_control() {
        return Err(WsError::UnsupportedFrameType {
            opcode: frame.opcode.code(),
            fin: true,
        });
    }
    Ok(frame.payload)
}
