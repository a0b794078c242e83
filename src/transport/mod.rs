//! Transport module - opening the byte stream.
//!
//! The client itself works over any `Read + Write` stream; this module only
//! provides the plain TCP connection the server normally listens on.

mod tcp;

pub use tcp::{connect, DEFAULT_PORT};
