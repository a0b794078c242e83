//! Frame struct: one complete header plus its body.
//!
//! Uses `bytes::Bytes` so the body can be handed to decoders without copying.
//!
//! # Example
//!
//! ```
//! use nntsc_client::protocol::{Frame, Header, MessageType};
//! use bytes::Bytes;
//!
//! let header = Header::outbound(MessageType::Live, 5);
//! let frame = Frame::new(header, Bytes::from_static(b"hello"));
//!
//! assert_eq!(frame.message_type(), Some(MessageType::Live));
//! assert_eq!(frame.body(), b"hello");
//! ```

use bytes::Bytes;

use super::wire_format::{Header, MessageType, HEADER_SIZE};
use crate::error::{NntscError, Result};

/// A complete protocol frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded header.
    pub header: Header,
    /// Body bytes (zero-copy via `bytes::Bytes`).
    pub body: Bytes,
}

impl Frame {
    /// Create a new frame from header and body.
    pub fn new(header: Header, body: Bytes) -> Self {
        Self { header, body }
    }

    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Known message type, `None` if the server sent a value we do not know.
    #[inline]
    pub fn message_type(&self) -> Option<MessageType> {
        self.header.kind()
    }

    #[inline]
    pub fn raw_message_type(&self) -> u16 {
        self.header.message_type
    }
}

/// Build a complete frame as a single byte vector.
///
/// The header's body length is taken from `body`, so the two cannot disagree.
/// Bodies that do not fit the 32-bit length field are rejected.
///
/// # Example
///
/// ```
/// use nntsc_client::protocol::{build_frame, MessageType, HEADER_SIZE};
///
/// let bytes = build_frame(MessageType::Push, b"hello").unwrap();
/// assert_eq!(bytes.len(), HEADER_SIZE + 5);
/// ```
pub fn build_frame(message_type: MessageType, body: &[u8]) -> Result<Vec<u8>> {
    let body_length = body_length(message_type, body.len())?;
    let header = Header::outbound(message_type, body_length);
    let mut buf = Vec::with_capacity(HEADER_SIZE + body.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(body);
    Ok(buf)
}

fn body_length(message_type: MessageType, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        NntscError::Protocol(format!(
            "{:?} body of {} bytes does not fit the length field",
            message_type, len
        ))
    })
}
