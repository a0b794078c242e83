//! Protocol module - wire format, framing, and message decoding.
//!
//! This module implements the binary protocol spoken with the server:
//! - 8-byte header encoding/decoding and the message type table
//! - Frame buffer for accumulating partial reads
//! - Message framer dispatching complete frames to typed messages

mod frame;
mod frame_buffer;
mod framer;
mod wire_format;

pub use frame::{build_frame, Frame};
pub use frame_buffer::FrameBuffer;
pub use framer::MessageFramer;
pub use wire_format::{
    encode_request_body, Header, MessageType, RequestKind, CLIENT_API_VERSION,
    DEFAULT_MAX_BODY_SIZE, HEADER_SIZE, PROTOCOL_VERSION, REQUEST_BODY_SIZE,
};
