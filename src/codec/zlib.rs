//! zlib streams via `flate2`.
//!
//! HISTORY bodies are a single zlib stream around the MessagePack body.
//! Inflation is capped so a small stream cannot expand without bound.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{NntscError, Result};

/// zlib compression for bulk HISTORY bodies.
pub struct ZlibCodec;

impl ZlibCodec {
    /// Compress `input` into one zlib stream at the default level.
    pub fn compress(input: &[u8]) -> Result<Vec<u8>> {
        let mut enc = ZlibEncoder::new(Vec::with_capacity(input.len() / 2), Compression::default());
        enc.write_all(input).map_err(NntscError::Zlib)?;
        enc.finish().map_err(NntscError::Zlib)
    }

    /// Inflate one complete zlib stream of at most `limit` bytes.
    pub fn decompress(input: &[u8], limit: u32) -> Result<Vec<u8>> {
        let limit = u64::from(limit);
        let mut dec = ZlibDecoder::new(input).take(limit + 1);
        let capacity = input.len().saturating_mul(4).min(limit as usize);
        let mut out = Vec::with_capacity(capacity);
        dec.read_to_end(&mut out).map_err(NntscError::Zlib)?;

        if out.len() as u64 > limit {
            return Err(NntscError::Protocol(format!(
                "Inflated body exceeds maximum {}",
                limit
            )));
        }
        Ok(out)
    }
}
