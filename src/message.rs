//! Decoded inbound messages.
//!
//! One variant per message type the server sends. Fields that carry a
//! collection *name* are called `collection`, fields that carry a numeric
//! collection *id* are called `collection_id`; the server uses one key for
//! both and the two meanings are kept apart here.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DisconnectReason;
use crate::labels::LabelSet;
use crate::protocol::MessageType;
use crate::Value;

/// A stream identifier as it appears in HISTORY and LIVE bodies.
///
/// Older servers send the numeric stream id, label-aware servers send the
/// label the data was requested under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamKey {
    Id(i64),
    Label(String),
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKey::Id(id) => write!(f, "{}", id),
            StreamKey::Label(label) => f.write_str(label),
        }
    }
}

impl From<i64> for StreamKey {
    fn from(id: i64) -> Self {
        StreamKey::Id(id)
    }
}

impl From<&str> for StreamKey {
    fn from(label: &str) -> Self {
        StreamKey::Label(label.to_string())
    }
}

impl From<String> for StreamKey {
    fn from(label: String) -> Self {
        StreamKey::Label(label)
    }
}

/// A message delivered to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Reply to a collection list request.
    Collections { collections: Vec<Value> },

    /// Schema of one collection.
    Schemas {
        collection: String,
        stream_schema: Value,
        data_schema: Value,
    },

    /// A batch of stream descriptions; `more` is set while batches remain.
    Streams {
        collection: String,
        more: bool,
        streams: Vec<Value>,
    },

    /// Historical data for one stream or label (decompressed).
    History {
        collection: String,
        stream_id: StreamKey,
        data: Value,
        more: bool,
        bin_size: i64,
    },

    /// Live data pushed for a subscription.
    Live {
        collection: String,
        stream_id: StreamKey,
        data: Value,
    },

    /// New data is available for a collection.
    Push { collection_id: i64, timestamp: i64 },

    /// The server gave up on an earlier request.
    QueryCancelled(Cancellation),

    /// Complete message of a type this client does not consume.
    Unhandled { message_type: u16 },
}

impl Message {
    /// Wire value of the message type this was decoded from.
    pub fn message_type(&self) -> u16 {
        let ty = match self {
            Message::Collections { .. } => MessageType::Collections,
            Message::Schemas { .. } => MessageType::Schemas,
            Message::Streams { .. } => MessageType::Streams,
            Message::History { .. } => MessageType::History,
            Message::Live { .. } => MessageType::Live,
            Message::Push { .. } => MessageType::Push,
            Message::QueryCancelled(_) => MessageType::QueryCancelled,
            Message::Unhandled { message_type } => return *message_type,
        };
        ty.as_u16()
    }
}

/// Which request was cancelled, with whatever the server sent back about it.
#[derive(Debug, Clone, PartialEq)]
pub enum Cancellation {
    /// A schema request for a collection.
    Schemas { collection_id: i64 },

    /// A stream list request (`request` is STREAMS or the retired
    /// ACTIVE_STREAMS); `boundary` is the stream id the listing started after.
    Streams {
        request: MessageType,
        collection_id: i64,
        boundary: i64,
    },

    /// A history query.
    History {
        collection: String,
        labels: LabelSet,
        start: i64,
        end: i64,
        more: bool,
    },

    /// Any other request; the accompanying data is not interpreted.
    Other { request: u16 },
}

impl Cancellation {
    /// Wire value of the cancelled request's message type.
    pub fn request(&self) -> u16 {
        match self {
            Cancellation::Schemas { .. } => MessageType::Schemas.as_u16(),
            Cancellation::Streams { request, .. } => request.as_u16(),
            Cancellation::History { .. } => MessageType::History.as_u16(),
            Cancellation::Other { request } => *request,
        }
    }
}

/// Result of asking the framer for the next message.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// No complete message is buffered yet; read more bytes.
    Pending,
    /// One message was decoded and removed from the buffer.
    Message(Message),
    /// The connection can no longer be used and must be closed.
    Disconnect(DisconnectReason),
}

impl ParseOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, ParseOutcome::Pending)
    }

    pub fn into_message(self) -> Option<Message> {
        match self {
            ParseOutcome::Message(message) => Some(message),
            _ => None,
        }
    }
}
