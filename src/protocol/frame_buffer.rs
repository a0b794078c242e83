//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for the receive buffer. Bytes are only removed
//! from the front once a whole frame (header and body) is present; a
//! partial header or a partial body leaves the buffer untouched.
//!
//! # Example
//!
//! ```
//! use nntsc_client::protocol::{build_frame, FrameBuffer, MessageType};
//!
//! let bytes = build_frame(MessageType::Push, b"abc").unwrap();
//! let mut buffer = FrameBuffer::new();
//!
//! buffer.extend(&bytes[..4]);
//! assert!(buffer.try_extract().unwrap().is_none());
//!
//! buffer.extend(&bytes[4..]);
//! let frame = buffer.try_extract().unwrap().unwrap();
//! assert_eq!(frame.body(), b"abc");
//! ```

use bytes::BytesMut;

use super::wire_format::{Header, DEFAULT_MAX_BODY_SIZE, HEADER_SIZE};
use super::Frame;
use crate::error::Result;

/// Buffer for accumulating incoming bytes and extracting complete frames.
pub struct FrameBuffer {
    /// Bytes received but not yet resolved into a frame.
    buffer: BytesMut,
    /// Maximum allowed body size.
    max_body_size: u32,
}

impl FrameBuffer {
    /// Create a new frame buffer with default settings.
    ///
    /// Default capacity: 256KB, max body: 1GB.
    pub fn new() -> Self {
        Self::with_max_body(DEFAULT_MAX_BODY_SIZE)
    }

    /// Create a new frame buffer with custom max body size.
    pub fn with_max_body(max_body_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(256 * 1024),
            max_body_size,
        }
    }

    /// Append data to the buffer without extracting frames.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Header of the frame at the front of the buffer, if 8 bytes are present.
    pub fn peek_header(&self) -> Option<Header> {
        Header::decode(&self.buffer)
    }

    /// Try to extract a single frame from the buffer.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete frame was extracted
    /// - `Ok(None)` if more data is needed (nothing consumed)
    /// - `Err(...)` if the header announces a body over the limit
    pub fn try_extract(&mut self) -> Result<Option<Frame>> {
        let header = match self.peek_header() {
            Some(header) => header,
            None => return Ok(None),
        };

        header.validate(self.max_body_size)?;

        if self.buffer.len() < header.total_len() {
            return Ok(None);
        }

        let mut frame_bytes = self.buffer.split_to(header.total_len());
        let body = frame_bytes.split_off(HEADER_SIZE).freeze();

        Ok(Some(Frame::new(header, body)))
    }

    /// Largest body accepted, before or after inflation.
    pub fn max_body_size(&self) -> u32 {
        self.max_body_size
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop everything buffered.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
