//! Error types for nntsc-client.

use thiserror::Error;

use crate::protocol::MessageType;

/// Main error type for all client operations.
#[derive(Debug, Error)]
pub enum NntscError {
    /// I/O error outside of a send/receive (e.g. connecting).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (configuration, re-shaping cancellation payloads).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Compressing or inflating a HISTORY body failed.
    #[error("zlib error: {0}")]
    Zlib(#[source] std::io::Error),

    /// Send or receive on the underlying stream failed.
    #[error("transport error during {operation} ({target}): {source}")]
    Transport {
        operation: &'static str,
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// Protocol error (oversized body, malformed field).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The caller asked for a feature the server no longer supports.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The server sent something that makes the connection unusable.
    #[error(transparent)]
    Fatal(#[from] DisconnectReason),

    /// Operation attempted on a closed connection.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Why the framer asked the caller to drop the connection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DisconnectReason {
    /// VERSION_CHECK carried a version other than the one we speak.
    #[error("client API version {expected} does not match version required by server ({received})")]
    ProtocolVersionMismatch {
        expected: String,
        received: serde_json::Value,
    },

    /// A message type this client refuses to process.
    #[error("{0:?} messages are not supported by this client")]
    UnsupportedMessage(MessageType),
}

/// Result type alias using NntscError.
pub type Result<T> = std::result::Result<T, NntscError>;
