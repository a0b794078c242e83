//! Message framer: turns buffered bytes into decoded [`Message`]s.
//!
//! The framer owns the receive buffer. Feed it whatever the transport
//! returned with [`MessageFramer::extend`], then call
//! [`MessageFramer::extract_next`] until it reports
//! [`ParseOutcome::Pending`].
//!
//! # Example
//!
//! ```
//! use nntsc_client::codec::{MsgPackCodec, StructuredCodec};
//! use nntsc_client::protocol::{build_frame, MessageFramer, MessageType};
//! use nntsc_client::{Message, ParseOutcome};
//!
//! let body = MsgPackCodec::encode(&(4i64, 1_400_000_000i64)).unwrap();
//! let bytes = build_frame(MessageType::Push, &body).unwrap();
//!
//! let mut framer = MessageFramer::new();
//! framer.extend(&bytes);
//! assert_eq!(
//!     framer.extract_next().unwrap(),
//!     ParseOutcome::Message(Message::Push { collection_id: 4, timestamp: 1_400_000_000 })
//! );
//! assert!(framer.extract_next().unwrap().is_pending());
//! ```

use std::marker::PhantomData;

use super::frame::Frame;
use super::frame_buffer::FrameBuffer;
use super::wire_format::{MessageType, CLIENT_API_VERSION, DEFAULT_MAX_BODY_SIZE};
use crate::codec::{MsgPackCodec, StructuredCodec, ZlibCodec};
use crate::error::{DisconnectReason, Result};
use crate::labels::LabelSet;
use crate::message::{Cancellation, Message, ParseOutcome, StreamKey};
use crate::Value;

/// Decodes complete messages from the front of an owned receive buffer.
pub struct MessageFramer<C = MsgPackCodec> {
    frames: FrameBuffer,
    expected_version: String,
    _codec: PhantomData<C>,
}

impl MessageFramer<MsgPackCodec> {
    /// Framer expecting [`CLIENT_API_VERSION`] with the default body limit.
    pub fn new() -> Self {
        Self::with_settings(CLIENT_API_VERSION, DEFAULT_MAX_BODY_SIZE)
    }
}

impl Default for MessageFramer<MsgPackCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: StructuredCodec> MessageFramer<C> {
    /// Framer with an explicit expected API version and body size limit.
    pub fn with_settings(expected_version: impl Into<String>, max_body_size: u32) -> Self {
        Self {
            frames: FrameBuffer::with_max_body(max_body_size),
            expected_version: expected_version.into(),
            _codec: PhantomData,
        }
    }

    /// Append bytes read from the transport.
    pub fn extend(&mut self, data: &[u8]) {
        self.frames.extend(data);
    }

    /// Number of bytes buffered and not yet part of a returned message.
    pub fn buffered(&self) -> usize {
        self.frames.len()
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn expected_version(&self) -> &str {
        &self.expected_version
    }

    /// Decode the next complete message.
    ///
    /// Nothing is consumed while the header or body is incomplete. A
    /// matching VERSION_CHECK is consumed without being reported and
    /// decoding carries on with whatever follows it. A decode failure
    /// consumes the offending message and returns the error.
    pub fn extract_next(&mut self) -> Result<ParseOutcome> {
        while let Some(frame) = self.frames.try_extract()? {
            if let Some(outcome) = self.dispatch(&frame)? {
                return Ok(outcome);
            }
        }
        Ok(ParseOutcome::Pending)
    }

    /// Decode one frame. `None` means it was consumed silently.
    fn dispatch(&self, frame: &Frame) -> Result<Option<ParseOutcome>> {
        let body = frame.body();

        let message_type = match frame.message_type() {
            Some(message_type) => message_type,
            None => {
                tracing::debug!("Skipping message of unknown type {}", frame.raw_message_type());
                return Ok(Some(ParseOutcome::Message(Message::Unhandled {
                    message_type: frame.raw_message_type(),
                })));
            }
        };

        let message = match message_type {
            MessageType::VersionCheck => {
                let received: Value = C::decode(body)?;
                if received.as_str() == Some(self.expected_version.as_str()) {
                    tracing::debug!("NNTSC protocol version check passed");
                    return Ok(None);
                }
                let reason = DisconnectReason::ProtocolVersionMismatch {
                    expected: self.expected_version.clone(),
                    received,
                };
                tracing::error!("{}", reason);
                return Ok(Some(ParseOutcome::Disconnect(reason)));
            }

            MessageType::ActiveStreams => {
                let reason = DisconnectReason::UnsupportedMessage(MessageType::ActiveStreams);
                tracing::error!("{}", reason);
                return Ok(Some(ParseOutcome::Disconnect(reason)));
            }

            MessageType::Collections => {
                let collections: Vec<Value> = C::decode(body)?;
                Message::Collections { collections }
            }

            MessageType::Schemas => {
                let (collection, stream_schema, data_schema): (String, Value, Value) =
                    C::decode(body)?;
                Message::Schemas {
                    collection,
                    stream_schema,
                    data_schema,
                }
            }

            MessageType::Streams => {
                let (collection, more, streams): (String, bool, Vec<Value>) = C::decode(body)?;
                Message::Streams {
                    collection,
                    more,
                    streams,
                }
            }

            MessageType::History => {
                let inflated = ZlibCodec::decompress(body, self.frames.max_body_size())?;
                let (collection, stream_id, data, more, bin_size): (
                    String,
                    StreamKey,
                    Value,
                    bool,
                    i64,
                ) = C::decode(&inflated)?;
                Message::History {
                    collection,
                    stream_id,
                    data,
                    more,
                    bin_size,
                }
            }

            MessageType::Live => {
                let (collection, stream_id, data): (String, StreamKey, Value) = C::decode(body)?;
                Message::Live {
                    collection,
                    stream_id,
                    data,
                }
            }

            MessageType::Push => {
                let (collection_id, timestamp): (i64, i64) = C::decode(body)?;
                Message::Push {
                    collection_id,
                    timestamp,
                }
            }

            MessageType::QueryCancelled => {
                let (request, data): (u16, Value) = C::decode(body)?;
                Message::QueryCancelled(decode_cancellation(request, data)?)
            }

            MessageType::Request
            | MessageType::Subscribe
            | MessageType::Unsubscribe
            | MessageType::Matrix
            | MessageType::Aggregate
            | MessageType::Percentile => {
                tracing::debug!("Ignoring client-bound copy of {:?}", message_type);
                Message::Unhandled {
                    message_type: message_type.as_u16(),
                }
            }
        };

        Ok(Some(ParseOutcome::Message(message)))
    }
}

/// Interpret the data attached to a QUERY_CANCELLED notice.
fn decode_cancellation(request: u16, data: Value) -> Result<Cancellation> {
    let cancellation = match MessageType::from_u16(request) {
        Some(MessageType::Schemas) => Cancellation::Schemas {
            collection_id: serde_json::from_value(data)?,
        },
        Some(kind @ (MessageType::Streams | MessageType::ActiveStreams)) => {
            let (collection_id, boundary): (i64, i64) = serde_json::from_value(data)?;
            Cancellation::Streams {
                request: kind,
                collection_id,
                boundary,
            }
        }
        Some(MessageType::History) => {
            let (collection, labels, start, end, more): (String, LabelSet, i64, i64, bool) =
                serde_json::from_value(data)?;
            Cancellation::History {
                collection,
                labels,
                start,
                end,
                more,
            }
        }
        _ => Cancellation::Other { request },
    };
    Ok(cancellation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NntscError;
    use crate::protocol::{build_frame, Header, HEADER_SIZE};
    use serde::Serialize;
    use serde_json::json;

    fn frame<T: Serialize>(message_type: MessageType, value: &T) -> Vec<u8> {
        build_frame(message_type, &MsgPackCodec::encode(value).unwrap()).unwrap()
    }

    fn history_frame(collection: &str, stream: StreamKey, data: Value, more: bool, bin: i64) -> Vec<u8> {
        let body = MsgPackCodec::encode(&(collection, stream, data, more, bin)).unwrap();
        build_frame(MessageType::History, &ZlibCodec::compress(&body).unwrap()).unwrap()
    }

    fn single(bytes: &[u8]) -> ParseOutcome {
        let mut framer = MessageFramer::new();
        framer.extend(bytes);
        framer.extract_next().unwrap()
    }

    #[test]
    fn test_empty_buffer_is_pending() {
        let mut framer = MessageFramer::new();
        assert!(framer.extract_next().unwrap().is_pending());
    }

    #[test]
    fn test_partial_message_consumes_nothing() {
        let bytes = frame(MessageType::Push, &(1i64, 2i64));
        let mut framer = MessageFramer::new();

        framer.extend(&bytes[..HEADER_SIZE - 3]);
        assert!(framer.extract_next().unwrap().is_pending());
        assert_eq!(framer.buffered(), HEADER_SIZE - 3);

        framer.extend(&bytes[HEADER_SIZE - 3..bytes.len() - 1]);
        assert!(framer.extract_next().unwrap().is_pending());
        assert_eq!(framer.buffered(), bytes.len() - 1);

        framer.extend(&bytes[bytes.len() - 1..]);
        assert!(framer.extract_next().unwrap().into_message().is_some());
        assert_eq!(framer.buffered(), 0);
    }

    #[test]
    fn test_collections() {
        let list = json!([{"id": 1, "module": "amp", "modsubtype": "icmp"}]);
        let outcome = single(&frame(MessageType::Collections, &list));
        assert_eq!(
            outcome,
            ParseOutcome::Message(Message::Collections {
                collections: list.as_array().unwrap().clone()
            })
        );
    }

    #[test]
    fn test_schemas() {
        let outcome = single(&frame(
            MessageType::Schemas,
            &("amp-icmp", json!(["source", "destination"]), json!(["rtt"])),
        ));
        assert_eq!(
            outcome,
            ParseOutcome::Message(Message::Schemas {
                collection: "amp-icmp".to_string(),
                stream_schema: json!(["source", "destination"]),
                data_schema: json!(["rtt"]),
            })
        );
    }

    #[test]
    fn test_streams() {
        let outcome = single(&frame(
            MessageType::Streams,
            &("amp-icmp", true, vec![json!({"stream_id": 7})]),
        ));
        assert_eq!(
            outcome,
            ParseOutcome::Message(Message::Streams {
                collection: "amp-icmp".to_string(),
                more: true,
                streams: vec![json!({"stream_id": 7})],
            })
        );
    }

    #[test]
    fn test_history_is_decompressed() {
        let rows = json!([{"timestamp": 100, "rtt": 12}, {"timestamp": 400, "rtt": 15}]);
        let bytes = history_frame("amp-icmp", StreamKey::from("ipv4"), rows.clone(), false, 300);
        assert_eq!(
            single(&bytes),
            ParseOutcome::Message(Message::History {
                collection: "amp-icmp".to_string(),
                stream_id: StreamKey::from("ipv4"),
                data: rows,
                more: false,
                bin_size: 300,
            })
        );
    }

    #[test]
    fn test_history_uncompressed_body_is_an_error() {
        let bytes = frame(MessageType::History, &("c", 1i64, json!([]), false, 0i64));
        let mut framer = MessageFramer::new();
        framer.extend(&bytes);
        let err = framer.extract_next().unwrap_err();
        assert!(matches!(err, NntscError::Zlib(_)));
        // the broken message is gone, the buffer is usable again
        assert_eq!(framer.buffered(), 0);
    }

    #[test]
    fn test_history_inflation_is_bounded() {
        let rows = Value::String("x".repeat(64 * 1024));
        let bytes = history_frame("amp-icmp", StreamKey::Id(1), rows, false, 60);
        assert!(bytes.len() < 4096);

        let mut framer: MessageFramer = MessageFramer::with_settings(CLIENT_API_VERSION, 4096);
        framer.extend(&bytes);
        let err = framer.extract_next().unwrap_err();

        assert!(matches!(err, NntscError::Protocol(_)));
        assert_eq!(framer.buffered(), 0);
    }

    #[test]
    fn test_live() {
        let outcome = single(&frame(
            MessageType::Live,
            &("rrd-smokeping", 12i64, json!({"median": 4.5})),
        ));
        assert_eq!(
            outcome,
            ParseOutcome::Message(Message::Live {
                collection: "rrd-smokeping".to_string(),
                stream_id: StreamKey::Id(12),
                data: json!({"median": 4.5}),
            })
        );
    }

    #[test]
    fn test_push() {
        let outcome = single(&frame(MessageType::Push, &(5i64, 1_400_000_300i64)));
        assert_eq!(
            outcome,
            ParseOutcome::Message(Message::Push {
                collection_id: 5,
                timestamp: 1_400_000_300,
            })
        );
    }

    #[test]
    fn test_version_match_is_silent_and_continues() {
        let mut bytes = frame(MessageType::VersionCheck, &CLIENT_API_VERSION);
        bytes.extend(frame(MessageType::Push, &(1i64, 2i64)));

        let mut framer = MessageFramer::new();
        framer.extend(&bytes);
        assert_eq!(
            framer.extract_next().unwrap(),
            ParseOutcome::Message(Message::Push {
                collection_id: 1,
                timestamp: 2
            })
        );
        assert!(framer.extract_next().unwrap().is_pending());
    }

    #[test]
    fn test_version_match_alone_is_pending() {
        let mut framer = MessageFramer::new();
        framer.extend(&frame(MessageType::VersionCheck, &CLIENT_API_VERSION));
        assert!(framer.extract_next().unwrap().is_pending());
        assert_eq!(framer.buffered(), 0);
    }

    #[test]
    fn test_version_mismatch_disconnects() {
        let outcome = single(&frame(MessageType::VersionCheck, &"0.9.0"));
        assert_eq!(
            outcome,
            ParseOutcome::Disconnect(DisconnectReason::ProtocolVersionMismatch {
                expected: CLIENT_API_VERSION.to_string(),
                received: json!("0.9.0"),
            })
        );
    }

    #[test]
    fn test_version_of_wrong_type_disconnects() {
        let outcome = single(&frame(MessageType::VersionCheck, &17i64));
        assert!(matches!(outcome, ParseOutcome::Disconnect(_)));
    }

    #[test]
    fn test_custom_expected_version() {
        let mut framer: MessageFramer = MessageFramer::with_settings("2.0", DEFAULT_MAX_BODY_SIZE);
        framer.extend(&frame(MessageType::VersionCheck, &"2.0"));
        assert!(framer.extract_next().unwrap().is_pending());
        assert_eq!(framer.expected_version(), "2.0");
    }

    #[test]
    fn test_active_streams_disconnects_without_decoding() {
        let bytes = build_frame(MessageType::ActiveStreams, b"\xff\xff not msgpack").unwrap();
        assert_eq!(
            single(&bytes),
            ParseOutcome::Disconnect(DisconnectReason::UnsupportedMessage(
                MessageType::ActiveStreams
            ))
        );
    }

    #[test]
    fn test_cancelled_history() {
        let data = ("cpuload", json!({"a": [1]}), 100i64, 200i64, false);
        let outcome = single(&frame(
            MessageType::QueryCancelled,
            &(MessageType::History.as_u16(), data),
        ));

        let mut labels = LabelSet::new();
        labels.insert("a", vec![1]);
        let message = outcome.into_message().unwrap();
        assert_eq!(message.message_type(), MessageType::QueryCancelled.as_u16());
        assert_eq!(
            message,
            Message::QueryCancelled(Cancellation::History {
                collection: "cpuload".to_string(),
                labels,
                start: 100,
                end: 200,
                more: false,
            })
        );
    }

    #[test]
    fn test_cancelled_schema() {
        let outcome = single(&frame(
            MessageType::QueryCancelled,
            &(MessageType::Schemas.as_u16(), 9i64),
        ));
        assert_eq!(
            outcome.into_message(),
            Some(Message::QueryCancelled(Cancellation::Schemas {
                collection_id: 9
            }))
        );
    }

    #[test]
    fn test_cancelled_streams_and_active_streams() {
        for kind in [MessageType::Streams, MessageType::ActiveStreams] {
            let outcome = single(&frame(MessageType::QueryCancelled, &(kind.as_u16(), (3i64, 250i64))));
            assert_eq!(
                outcome.into_message(),
                Some(Message::QueryCancelled(Cancellation::Streams {
                    request: kind,
                    collection_id: 3,
                    boundary: 250,
                }))
            );
        }
    }

    #[test]
    fn test_cancelled_other_request() {
        let outcome = single(&frame(
            MessageType::QueryCancelled,
            &(MessageType::Aggregate.as_u16(), json!({"whatever": true})),
        ));
        let message = outcome.into_message().unwrap();
        match message {
            Message::QueryCancelled(cancel) => {
                assert_eq!(cancel.request(), MessageType::Aggregate.as_u16());
                assert!(matches!(cancel, Cancellation::Other { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cancelled_history_with_bad_shape_is_an_error() {
        let bytes = frame(MessageType::QueryCancelled, &(MessageType::History.as_u16(), (1i64, 2i64)));
        let mut framer = MessageFramer::new();
        framer.extend(&bytes);
        assert!(matches!(framer.extract_next(), Err(NntscError::Json(_))));
    }

    #[test]
    fn test_unknown_type_is_unhandled() {
        let mut bytes = Header::new(1, 200, 3).encode().to_vec();
        bytes.extend_from_slice(b"abc");
        assert_eq!(
            single(&bytes),
            ParseOutcome::Message(Message::Unhandled { message_type: 200 })
        );
    }

    #[test]
    fn test_outbound_type_is_unhandled() {
        let bytes = build_frame(MessageType::Subscribe, b"").unwrap();
        assert_eq!(
            single(&bytes),
            ParseOutcome::Message(Message::Unhandled {
                message_type: MessageType::Subscribe.as_u16()
            })
        );
    }

    #[test]
    fn test_oversized_body_is_an_error() {
        let mut framer: MessageFramer = MessageFramer::with_settings(CLIENT_API_VERSION, 16);
        framer.extend(&Header::outbound(MessageType::Live, 17).encode());
        assert!(matches!(framer.extract_next(), Err(NntscError::Protocol(_))));
    }

    #[test]
    fn test_decode_error_on_wrong_arity() {
        let mut framer = MessageFramer::new();
        framer.extend(&frame(MessageType::Push, &(1i64,)));
        framer.extend(&frame(MessageType::Push, &(2i64, 3i64)));

        assert!(matches!(framer.extract_next(), Err(NntscError::MsgPackDecode(_))));
        assert_eq!(
            framer.extract_next().unwrap(),
            ParseOutcome::Message(Message::Push {
                collection_id: 2,
                timestamp: 3
            })
        );
    }
}
