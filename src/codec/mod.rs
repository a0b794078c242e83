//! Codec module - body serialization and compression.
//!
//! - [`StructuredCodec`] - the structured-value encoding shared with the server
//! - [`MsgPackCodec`] - MessagePack implementation using `rmp-serde`
//! - [`ZlibCodec`] - zlib streams wrapping HISTORY bodies
//!
//! # Design
//!
//! Codecs are marker structs with associated functions rather than trait
//! objects. The framer and request encoders are generic over
//! [`StructuredCodec`], so the codec is picked at compile time.
//!
//! # Example
//!
//! ```
//! use nntsc_client::codec::{MsgPackCodec, StructuredCodec, ZlibCodec};
//!
//! let encoded = MsgPackCodec::encode(&("cpuload", 42i64)).unwrap();
//! let compressed = ZlibCodec::compress(&encoded).unwrap();
//! let restored = ZlibCodec::decompress(&compressed, 1024).unwrap();
//! let decoded: (String, i64) = MsgPackCodec::decode(&restored).unwrap();
//! assert_eq!(decoded, ("cpuload".to_string(), 42));
//! ```

mod msgpack;
mod zlib;

pub use msgpack::MsgPackCodec;
pub use zlib::ZlibCodec;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Self-describing encoding of nested maps, sequences and scalars.
///
/// Both peers must use the same implementation; tuples are positional
/// sequences and field order is part of the contract.
pub trait StructuredCodec {
    /// Encode a value to bytes.
    fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>>;

    /// Decode bytes to a value.
    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T>;
}
