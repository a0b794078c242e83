//! MsgPack codec using `rmp-serde`.
//!
//! Request and response bodies are tuples, which MessagePack writes as
//! arrays, so the positional order of every tuple is what the server reads.
//! Structs (only used by callers inside opaque parameter bundles) are written
//! with `to_vec_named` so they arrive as maps with field names.
//!
//! # Example
//!
//! ```
//! use nntsc_client::codec::{MsgPackCodec, StructuredCodec};
//!
//! let encoded = MsgPackCodec::encode(&(1i64, "avg")).unwrap();
//! let decoded: (i64, String) = MsgPackCodec::decode(&encoded).unwrap();
//! assert_eq!(decoded, (1, "avg".to_string()));
//! ```

use super::StructuredCodec;
use crate::error::Result;

/// MessagePack codec for structured data.
pub struct MsgPackCodec;

impl StructuredCodec for MsgPackCodec {
    #[inline]
    fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    #[inline]
    fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
