//! # nntsc-client
//!
//! Rust client for the NNTSC time-series collector protocol.
//!
//! The server speaks a length-prefixed binary protocol over one persistent
//! TCP connection: every message is an 8-byte header followed by a
//! MessagePack body (zlib-compressed for bulk history data).
//!
//! ## Architecture
//!
//! - **Request encoding** ([`request`]): one frame builder per query kind
//! - **Framing** ([`protocol::MessageFramer`]): buffers received bytes and
//!   decodes complete messages into [`Message`] values
//! - **Connection** ([`Client`]): blocking, single-threaded glue between a
//!   `Read + Write` stream, the encoders and the framer
//!
//! ## Example
//!
//! ```ignore
//! use nntsc_client::{AggregateQuery, Client, Message, ParseOutcome};
//!
//! let mut client = Client::builder().connect("localhost:61234")?;
//! let query = AggregateQuery::new(3, vec![14, 15], 1_400_000_000, 1_400_086_400,
//!                                 vec!["rtt".into()], 300);
//! client.request_aggregate(&query)?;
//!
//! loop {
//!     if client.receive()? == 0 {
//!         break;
//!     }
//!     loop {
//!         match client.extract_next()? {
//!             ParseOutcome::Message(Message::History { stream_id, data, .. }) => {
//!                 println!("{}: {}", stream_id, data);
//!             }
//!             ParseOutcome::Message(_) => {}
//!             ParseOutcome::Pending => break,
//!             ParseOutcome::Disconnect(reason) => return Err(reason.into()),
//!         }
//!     }
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod labels;
pub mod message;
pub mod protocol;
pub mod request;
pub mod transport;

mod client;

pub use client::{Client, ClientBuilder, DrainStop, Drained};
pub use config::ClientConfig;
pub use error::{DisconnectReason, NntscError};
pub use labels::{LabelSet, Labels};
pub use message::{Cancellation, Message, ParseOutcome, StreamKey};
pub use protocol::{MessageType, RequestKind};
pub use request::{AggregateQuery, MatrixQuery, PercentileQuery, Subscription};

/// Opaque structured value carried in message bodies.
pub use serde_json::Value;
