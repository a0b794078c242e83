//! Wire format encoding and decoding.
//!
//! Every message starts with an 8-byte header:
//! ```text
//! ┌──────────┬──────────┬─────────────┐
//! │ Version  │ Type     │ Body length │
//! │ 2 bytes  │ 2 bytes  │ 4 bytes     │
//! │ uint16 BE│ uint16 BE│ uint32 BE   │
//! └──────────┴──────────┴─────────────┘
//! ```
//!
//! All multi-byte integers are Big Endian.

use crate::error::{NntscError, Result};

/// Header size in bytes (fixed, exactly 8).
pub const HEADER_SIZE: usize = 8;

/// Protocol version written into every outbound header.
pub const PROTOCOL_VERSION: u16 = 1;

/// API version this client expects the server to announce in VERSION_CHECK.
pub const CLIENT_API_VERSION: &str = "1.7.0";

/// Default maximum body size (1 GB).
pub const DEFAULT_MAX_BODY_SIZE: u32 = 1_073_741_824;

/// Size of the packed REQUEST body: kind, collection, start (u32 BE each).
pub const REQUEST_BODY_SIZE: usize = 12;

/// Message types shared with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MessageType {
    Request = 0,
    Collections = 1,
    Schemas = 2,
    Streams = 3,
    History = 4,
    /// Retired; receiving one is fatal, requesting one is rejected.
    ActiveStreams = 5,
    Live = 6,
    Subscribe = 7,
    Aggregate = 8,
    Percentile = 9,
    Push = 10,
    Matrix = 11,
    VersionCheck = 12,
    QueryCancelled = 13,
    Unsubscribe = 14,
}

impl MessageType {
    /// Wire value of this message type.
    #[inline]
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Look up a wire value. Returns `None` for values we do not know.
    pub fn from_u16(value: u16) -> Option<Self> {
        let ty = match value {
            0 => Self::Request,
            1 => Self::Collections,
            2 => Self::Schemas,
            3 => Self::Streams,
            4 => Self::History,
            5 => Self::ActiveStreams,
            6 => Self::Live,
            7 => Self::Subscribe,
            8 => Self::Aggregate,
            9 => Self::Percentile,
            10 => Self::Push,
            11 => Self::Matrix,
            12 => Self::VersionCheck,
            13 => Self::QueryCancelled,
            14 => Self::Unsubscribe,
            _ => return None,
        };
        Some(ty)
    }
}

/// Sub-kinds carried in the body of a REQUEST message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RequestKind {
    /// List all collections. The collection field is always sent as 0.
    Collections = 0,
    /// Schema of one collection.
    Schema = 1,
    /// Streams of one collection, starting after a stream id.
    Streams = 2,
    /// Retired, rejected before anything is sent.
    ActiveStreams = 3,
}

impl RequestKind {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Decoded header from wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Protocol version of the sender.
    pub version: u16,
    /// Raw message type (see [`MessageType`]).
    pub message_type: u16,
    /// Body length in bytes, excluding the header.
    pub body_length: u32,
}

impl Header {
    /// Create a new header.
    pub fn new(version: u16, message_type: u16, body_length: u32) -> Self {
        Self {
            version,
            message_type,
            body_length,
        }
    }

    /// Header for an outbound message of the given type.
    pub fn outbound(message_type: MessageType, body_length: u32) -> Self {
        Self::new(PROTOCOL_VERSION, message_type.as_u16(), body_length)
    }

    /// Encode header to bytes (Big Endian).
    ///
    /// # Example
    ///
    /// ```
    /// use nntsc_client::protocol::{Header, MessageType};
    ///
    /// let header = Header::outbound(MessageType::Matrix, 100);
    /// let bytes = header.encode();
    /// assert_eq!(bytes.len(), 8);
    /// ```
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        self.encode_into(&mut buf);
        buf
    }

    /// Encode header into an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if buffer is smaller than `HEADER_SIZE` (8 bytes).
    pub fn encode_into(&self, buf: &mut [u8]) {
        debug_assert!(buf.len() >= HEADER_SIZE);
        buf[0..2].copy_from_slice(&self.version.to_be_bytes());
        buf[2..4].copy_from_slice(&self.message_type.to_be_bytes());
        buf[4..8].copy_from_slice(&self.body_length.to_be_bytes());
    }

    /// Decode header from bytes (Big Endian).
    ///
    /// Returns `None` if buffer is too short.
    ///
    /// # Example
    ///
    /// ```
    /// use nntsc_client::protocol::Header;
    ///
    /// let bytes = [0, 1, 0, 4, 0, 0, 0, 100];
    /// let header = Header::decode(&bytes).unwrap();
    /// assert_eq!(header.version, 1);
    /// assert_eq!(header.message_type, 4);
    /// assert_eq!(header.body_length, 100);
    /// ```
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < HEADER_SIZE {
            return None;
        }
        Some(Self {
            version: u16::from_be_bytes([buf[0], buf[1]]),
            message_type: u16::from_be_bytes([buf[2], buf[3]]),
            body_length: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        })
    }

    /// Check the body length against the configured maximum.
    pub fn validate(&self, max_body_size: u32) -> Result<()> {
        if self.body_length > max_body_size {
            return Err(NntscError::Protocol(format!(
                "Body size {} exceeds maximum {}",
                self.body_length, max_body_size
            )));
        }
        Ok(())
    }

    /// Header plus body length.
    #[inline]
    pub fn total_len(&self) -> usize {
        HEADER_SIZE + self.body_length as usize
    }

    /// Known message type, if any.
    #[inline]
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_u16(self.message_type)
    }
}

/// Encode the packed REQUEST body.
pub fn encode_request_body(kind: RequestKind, collection: u32, start: u32) -> [u8; REQUEST_BODY_SIZE] {
    let mut buf = [0u8; REQUEST_BODY_SIZE];
    buf[0..4].copy_from_slice(&kind.as_u32().to_be_bytes());
    buf[4..8].copy_from_slice(&collection.to_be_bytes());
    buf[8..12].copy_from_slice(&start.to_be_bytes());
    buf
}
