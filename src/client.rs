//! Client builder and connection handle.
//!
//! A [`Client`] owns the byte stream and the [`MessageFramer`] for one
//! connection. It is driven by a single thread:
//! 1. `receive()` pulls whatever the server has sent into the framer
//! 2. `extract_next()` (or `drain()`) hands out every complete message
//! 3. request methods write new queries on the same stream
//!
//! # Example
//!
//! ```ignore
//! use nntsc_client::{Client, Message, ParseOutcome, RequestKind};
//!
//! let mut client = Client::builder().connect("localhost:61234")?;
//! client.send_request(RequestKind::Collections, 0, 0)?;
//!
//! while client.receive()? > 0 {
//!     let drained = client.drain()?;
//!     for message in &drained.messages {
//!         if let Message::Collections { collections } = message {
//!             println!("{} collections", collections.len());
//!         }
//!     }
//!     if drained.is_fatal() {
//!         break;
//!     }
//! }
//! ```

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::codec::{MsgPackCodec, StructuredCodec};
use crate::config::ClientConfig;
use crate::error::{DisconnectReason, NntscError, Result};
use crate::labels::Labels;
use crate::message::{Message, ParseOutcome, StreamKey};
use crate::protocol::{MessageFramer, RequestKind};
use crate::request::{
    encode_aggregate, encode_matrix, encode_percentile, encode_request, encode_subscribe,
    encode_unsubscribe, AggregateQuery, MatrixQuery, PercentileQuery, Subscription,
};
use crate::transport;
use crate::Value;

/// Builder for configuring and creating a client.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a new client builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// API version the server must announce.
    pub fn expected_version(mut self, version: impl Into<String>) -> Self {
        self.config.expected_version = version.into();
        self
    }

    /// Maximum bytes read per `receive()`.
    ///
    /// Default: 256000
    pub fn recv_chunk_size(mut self, size: usize) -> Self {
        self.config.recv_chunk_size = size;
        self
    }

    /// Largest message body accepted.
    ///
    /// Default: 1 GB
    pub fn max_body_size(mut self, size: u32) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Socket read timeout (TCP connections only).
    ///
    /// Rounded up to whole milliseconds; `Duration::ZERO` disables it.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        let mut ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        if ms == 0 && !timeout.is_zero() {
            ms = 1;
        }
        self.config.read_timeout_ms = Some(ms);
        self
    }

    /// Toggle `TCP_NODELAY` (TCP connections only).
    ///
    /// Default: true
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    /// Wrap an already connected stream.
    pub fn build<S: Read + Write>(self, stream: S) -> Client<S> {
        self.build_with_codec(stream)
    }

    /// Wrap a stream, using a custom structured-value codec.
    pub fn build_with_codec<S: Read + Write, C: StructuredCodec>(self, stream: S) -> Client<S, C> {
        Client::with_config(stream, self.config)
    }

    /// Open a TCP connection and wrap it.
    pub fn connect<A: ToSocketAddrs>(self, addr: A) -> Result<Client<TcpStream>> {
        let stream = transport::connect(addr, &self.config)?;
        Ok(self.build(stream))
    }
}

/// A connection to an NNTSC server.
pub struct Client<S, C = MsgPackCodec> {
    /// `None` once the connection is closed.
    stream: Option<S>,
    framer: MessageFramer<C>,
    recv_buf: Vec<u8>,
}

impl Client<TcpStream> {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<S: Read + Write, C: StructuredCodec> Client<S, C> {
    fn with_config(stream: S, config: ClientConfig) -> Self {
        Self {
            stream: Some(stream),
            framer: MessageFramer::with_settings(config.expected_version, config.max_body_size),
            recv_buf: vec![0u8; config.recv_chunk_size.max(1)],
        }
    }

    /// Whether the connection is still open.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Close the connection. Closing twice is a no-op.
    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Closing NNTSC client connection");
        }
        self.framer.clear();
    }

    /// The underlying stream, while connected.
    pub fn stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    /// Bytes received but not yet returned as messages.
    pub fn buffered(&self) -> usize {
        self.framer.buffered()
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.stream.is_none() {
            tracing::warn!("Cannot send {} on a closed connection", operation);
            return Err(NntscError::ConnectionClosed);
        }
        Ok(())
    }

    /// Write one complete frame in a single call.
    fn send(&mut self, operation: &'static str, target: String, frame: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(NntscError::ConnectionClosed)?;
        if let Err(source) = stream.write_all(frame).and_then(|()| stream.flush()) {
            tracing::error!("Error sending {} for {}: {}", operation, target, source);
            return Err(NntscError::Transport {
                operation,
                target,
                source,
            });
        }
        Ok(())
    }

    /// Ask for the collection list, a collection's schema, or its streams.
    ///
    /// For [`RequestKind::Collections`] the collection is ignored and sent
    /// as 0. [`RequestKind::ActiveStreams`] is rejected without sending, as
    /// are ids that do not fit the unsigned 32-bit wire fields.
    pub fn send_request(&mut self, kind: RequestKind, collection: i64, start: i64) -> Result<()> {
        self.ensure_open("NNTSC_REQUEST")?;
        let frame = encode_request(kind, collection, start).map_err(|e| {
            tracing::warn!("{}", e);
            e
        })?;
        self.send(
            "NNTSC_REQUEST",
            format!("{:?} request, collection {}", kind, collection),
            &frame,
        )
    }

    /// Subscribe to live data for `labels` (or a legacy list of stream ids).
    pub fn subscribe(
        &mut self,
        name: &str,
        columns: Vec<String>,
        labels: impl Into<Labels>,
        start: i64,
        end: i64,
        aggregation: Value,
    ) -> Result<()> {
        self.ensure_open("NNTSC_SUBSCRIBE")?;
        let sub = Subscription::new(name, columns, labels, start, end, aggregation);
        let frame = encode_subscribe::<C>(&sub)?;
        self.send("NNTSC_SUBSCRIBE", sub.name, &frame)
    }

    /// Stop live updates for some streams of a collection.
    pub fn unsubscribe(&mut self, collection: i64, streams: &[StreamKey]) -> Result<()> {
        self.ensure_open("NNTSC_UNSUBSCRIBE")?;
        let frame = encode_unsubscribe::<C>(collection, streams)?;
        self.send("NNTSC_UNSUBSCRIBE", collection.to_string(), &frame)
    }

    pub fn request_matrix(&mut self, query: &MatrixQuery) -> Result<()> {
        self.ensure_open("NNTSC_MATRIX")?;
        let frame = encode_matrix::<C>(query)?;
        self.send("NNTSC_MATRIX", query.collection.to_string(), &frame)
    }

    pub fn request_aggregate(&mut self, query: &AggregateQuery) -> Result<()> {
        self.ensure_open("NNTSC_AGGREGATE")?;
        let frame = encode_aggregate::<C>(query)?;
        self.send("NNTSC_AGGREGATE", query.collection.to_string(), &frame)
    }

    pub fn request_percentile(&mut self, query: &PercentileQuery) -> Result<()> {
        self.ensure_open("NNTSC_PERCENTILE")?;
        let frame = encode_percentile::<C>(query)?;
        self.send("NNTSC_PERCENTILE", query.collection.to_string(), &frame)
    }

    /// Read up to one chunk from the stream into the receive buffer.
    ///
    /// Blocks until data arrives. Returns the number of bytes added;
    /// `Ok(0)` means the server closed the connection.
    pub fn receive(&mut self) -> Result<usize> {
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => {
                tracing::warn!("Cannot receive messages on a closed connection");
                return Err(NntscError::ConnectionClosed);
            }
        };

        let n = match stream.read(&mut self.recv_buf) {
            Ok(n) => n,
            Err(source) => {
                tracing::error!("Error receiving data from server: {}", source);
                return Err(NntscError::Transport {
                    operation: "receive",
                    target: "server".to_string(),
                    source,
                });
            }
        };

        if n == 0 {
            tracing::debug!("Server closed the connection");
            return Ok(0);
        }

        self.framer.extend(&self.recv_buf[..n]);
        Ok(n)
    }

    /// Decode the next buffered message.
    ///
    /// A `Disconnect` outcome or a decode error closes the connection
    /// before returning.
    pub fn extract_next(&mut self) -> Result<ParseOutcome> {
        if self.stream.is_none() {
            return Err(NntscError::ConnectionClosed);
        }

        match self.framer.extract_next() {
            Ok(ParseOutcome::Disconnect(reason)) => {
                tracing::error!("Closing client connection: {}", reason);
                self.disconnect();
                Ok(ParseOutcome::Disconnect(reason))
            }
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!("Closing client connection after decode failure: {}", e);
                self.disconnect();
                Err(e)
            }
        }
    }

    /// Decode every complete message currently buffered.
    ///
    /// Messages decoded before a fatal outcome or a decode failure are
    /// always returned; [`Drained::stop`] says why decoding stopped. Only a
    /// connection that was already closed is an `Err`.
    pub fn drain(&mut self) -> Result<Drained> {
        if self.stream.is_none() {
            return Err(NntscError::ConnectionClosed);
        }

        let mut messages = Vec::new();
        let stop = loop {
            match self.extract_next() {
                Ok(ParseOutcome::Message(message)) => messages.push(message),
                Ok(ParseOutcome::Pending) => break DrainStop::Pending,
                Ok(ParseOutcome::Disconnect(reason)) => break DrainStop::Disconnect(reason),
                Err(e) => break DrainStop::Failed(e),
            }
        };
        Ok(Drained { messages, stop })
    }
}

/// Why a [`Client::drain`] call stopped.
#[derive(Debug)]
pub enum DrainStop {
    /// Nothing complete is left; read more bytes.
    Pending,
    /// The server sent something fatal. The connection is closed.
    Disconnect(DisconnectReason),
    /// A message could not be decoded. The connection is closed.
    Failed(NntscError),
}

/// Messages handed out by one [`Client::drain`] call.
#[derive(Debug)]
pub struct Drained {
    pub messages: Vec<Message>,
    pub stop: DrainStop,
}

impl Drained {
    /// Whether draining ended with the connection closed.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.stop, DrainStop::Pending)
    }
}
