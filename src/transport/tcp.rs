//! Blocking TCP connection to an NNTSC server.
//!
//! # Example
//!
//! ```ignore
//! use nntsc_client::transport::connect;
//! use nntsc_client::ClientConfig;
//!
//! let stream = connect("localhost:61234", &ClientConfig::default())?;
//! ```

use std::net::{TcpStream, ToSocketAddrs};

use crate::config::ClientConfig;
use crate::error::Result;

/// Default NNTSC server port.
pub const DEFAULT_PORT: u16 = 61234;

/// Open a TCP stream and apply the socket options from `config`.
pub fn connect<A: ToSocketAddrs>(addr: A, config: &ClientConfig) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr)?;
    stream.set_nodelay(config.nodelay)?;
    stream.set_read_timeout(config.read_timeout())?;

    if let Ok(peer) = stream.peer_addr() {
        tracing::debug!("Connected to NNTSC at {}", peer);
    }
    Ok(stream)
}
