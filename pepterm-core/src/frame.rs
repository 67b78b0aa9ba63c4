//! PeP frame structure and encoding/decoding

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::{
    checksum,
    constants::{ETX, FS, FS_CHAR, FS_STR, STX, headers},
    error::{Error, Result},
    header::{Direction, FrameKind},
};

/// Parsed representation of one PeP wire message
///
/// # Frame layout
///
/// ```text
/// ┌─────────┬────────────┬─────────┬──────────────────┬─────────┬─────────┐
/// │   STX   │   header   │   FS    │  FS-or-code,     │   ETX   │   LRC   │
/// │ 1 byte  │  7 ASCII   │ 1 byte  │  payload text    │ 1 byte  │ 1 byte  │
/// └─────────┴────────────┴─────────┴──────────────────┴─────────┴─────────┘
/// ```
///
/// The LRC is the XOR of every byte after `STX` through `ETX` inclusive.
///
/// Two payload shapes exist, distinguished by the header prefix:
/// - Register-originated frames put a second separator right after the
///   header (an empty segment); any remaining segments are the field data,
///   joined without separators on parse.
/// - Terminal-originated frames (header prefix `UP1`) put a two-character
///   status code after the first separator; code and any field data stay
///   joined with the separator for the session layer to split.
///
/// # Examples
///
/// ```
/// use pepterm_core::Frame;
///
/// let raw = Frame::build("UP00101", "DF01020001");
/// let frame = Frame::parse(&raw).unwrap();
/// assert_eq!(frame.header, "UP00101");
/// assert_eq!(frame.payload, "DF01020001");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    /// Seven-character routing header, e.g. `UP00101`
    pub header: String,

    /// Decoded payload text, shaped per the header prefix rules above
    pub payload: String,

    /// Original datagram bytes, retained for diagnostics
    pub raw: Bytes,
}

impl Frame {
    /// Build a register-originated frame
    ///
    /// Produces `STX + header + FS + FS + data + ETX + LRC`. No length limit
    /// is enforced here; field-level width rules live in the TLV codec.
    pub fn build(header: &str, data: &str) -> Bytes {
        let mut body = BytesMut::with_capacity(header.len() + data.len() + 3);
        body.put_slice(header.as_bytes());
        body.put_u8(FS);
        body.put_u8(FS);
        body.put_slice(data.as_bytes());
        body.put_u8(ETX);

        Self::seal(body)
    }

    /// Build a terminal-originated frame carrying a status code
    ///
    /// Produces `STX + header + FS + code + ETX + LRC`, with `FS + data`
    /// inserted before `ETX` when `data` is non-empty.
    pub fn build_status(header: &str, code: &str, data: &str) -> Bytes {
        let mut body =
            BytesMut::with_capacity(header.len() + code.len() + data.len() + 3);
        body.put_slice(header.as_bytes());
        body.put_u8(FS);
        body.put_slice(code.as_bytes());
        if !data.is_empty() {
            body.put_u8(FS);
            body.put_slice(data.as_bytes());
        }
        body.put_u8(ETX);

        Self::seal(body)
    }

    /// Prefix the start marker and append the LRC
    fn seal(body: BytesMut) -> Bytes {
        let lrc = checksum::calculate(&body);

        let mut frame = BytesMut::with_capacity(body.len() + 2);
        frame.put_u8(STX);
        frame.put_slice(&body);
        frame.put_u8(lrc);
        frame.freeze()
    }

    /// Parse a received datagram into a frame
    ///
    /// Bytes after the LRC are ignored. Payload text is decoded lossily, so
    /// stray non-UTF-8 bytes surface as replacement characters instead of
    /// failing the whole frame.
    ///
    /// # Errors
    ///
    /// - `Malformed` if the input is shorter than 4 bytes, does not begin
    ///   with the start marker, or carries no separator after the header
    /// - `Truncated` if the end marker or the checksum byte is missing
    /// - `ChecksumMismatch` if the LRC does not cover the received body
    ///
    /// # Examples
    ///
    /// ```
    /// use pepterm_core::Frame;
    ///
    /// let raw = Frame::build_status("UP10151", "00", "DF5602AB12");
    /// let frame = Frame::parse(&raw).unwrap();
    /// assert_eq!(frame.payload, "00\u{1C}DF5602AB12");
    /// ```
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < 4 {
            return Err(Error::Malformed {
                reason: "shorter than 4 bytes",
            });
        }
        if buf[0] != STX {
            return Err(Error::Malformed {
                reason: "missing start marker",
            });
        }

        // Linear scan for the end marker, starting after STX
        let etx = buf[1..]
            .iter()
            .position(|&b| b == ETX)
            .map(|i| i + 1)
            .ok_or(Error::Truncated {
                reason: "no end marker",
            })?;

        let received = *buf.get(etx + 1).ok_or(Error::Truncated {
            reason: "missing checksum byte",
        })?;

        // Integrity gate: LRC covers everything after STX through ETX
        let expected = checksum::calculate(&buf[1..=etx]);
        if expected != received {
            return Err(Error::ChecksumMismatch { expected, received });
        }

        let body = String::from_utf8_lossy(&buf[1..etx]);
        let parts: Vec<&str> = body.split(FS_CHAR).collect();
        if parts.len() < 2 {
            return Err(Error::Malformed {
                reason: "no separator after header",
            });
        }

        let header = parts[0].to_string();
        let payload = if header.starts_with(headers::TERMINAL_PREFIX) {
            // Keep the status code and any field data joined
            parts[1..].join(FS_STR)
        } else {
            // Drop the empty segment after the header, join the rest bare
            parts[2..].join("")
        };

        Ok(Self {
            header,
            payload,
            raw: Bytes::copy_from_slice(buf),
        })
    }

    /// Classify this frame by its header
    pub fn kind(&self) -> FrameKind {
        FrameKind::classify(&self.header)
    }

    /// Originator derived from the header's direction digit
    pub fn direction(&self) -> Option<Direction> {
        self.header
            .as_bytes()
            .get(2)
            .copied()
            .and_then(Direction::from_byte)
    }

    /// Two-character module code at header offsets 3-4
    pub fn module(&self) -> Option<&str> {
        self.header.get(3..5)
    }

    /// Two-character command code at header offsets 5-6
    pub fn command(&self) -> Option<&str> {
        self.header.get(5..7)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("header", &self.header)
            .field("kind", &self.kind())
            .field("payload", &self.payload)
            .field("raw", &hex::encode(&self.raw))
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frame[{}]({}, len={})",
            self.header,
            self.kind(),
            self.payload.len()
        )
    }
}
