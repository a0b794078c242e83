//! Client configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```
//! use nntsc_client::ClientConfig;
//!
//! let config = ClientConfig::from_json(r#"{ "recv_chunk_size": 65536 }"#).unwrap();
//! assert_eq!(config.recv_chunk_size, 65536);
//! assert_eq!(config.expected_version, nntsc_client::protocol::CLIENT_API_VERSION);
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;
use crate::protocol::{CLIENT_API_VERSION, DEFAULT_MAX_BODY_SIZE};

/// Default number of bytes requested from the transport per receive.
pub const DEFAULT_RECV_CHUNK_SIZE: usize = 256_000;

/// Settings for a [`Client`](crate::Client) and its TCP connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API version the server must announce in VERSION_CHECK.
    pub expected_version: String,
    /// Upper bound on bytes read per `receive`.
    pub recv_chunk_size: usize,
    /// Largest body accepted before the connection is dropped.
    pub max_body_size: u32,
    /// Socket read timeout in milliseconds; `None` or 0 blocks indefinitely.
    pub read_timeout_ms: Option<u64>,
    /// Disable Nagle's algorithm on TCP connections.
    pub nodelay: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            expected_version: CLIENT_API_VERSION.to_string(),
            recv_chunk_size: DEFAULT_RECV_CHUNK_SIZE,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            read_timeout_ms: None,
            nodelay: true,
        }
    }
}

impl ClientConfig {
    /// Parse a JSON document; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read timeout to apply to the socket. Zero means no timeout.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }
}
