//! Shared helpers: a scripted stream and a server-side frame builder.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use nntsc_client::codec::{MsgPackCodec, StructuredCodec, ZlibCodec};
use nntsc_client::protocol::{build_frame, Header, MessageType, HEADER_SIZE};
use nntsc_client::{Client, ClientBuilder, Message, ParseOutcome};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Stream that hands out pre-split chunks, one per `read`, and records writes.
pub struct ChunkedStream {
    chunks: VecDeque<Vec<u8>>,
    pub sent: Vec<u8>,
    pub fail_writes: bool,
    pub fail_reads: bool,
}

impl ChunkedStream {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
            sent: Vec::new(),
            fail_writes: false,
            fail_reads: false,
        }
    }

    /// Split `bytes` at the given offsets (out-of-range offsets are ignored).
    pub fn split_at(bytes: &[u8], cuts: &[usize]) -> Self {
        let mut cuts: Vec<usize> = cuts.iter().copied().filter(|&c| c > 0 && c < bytes.len()).collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut chunks = Vec::new();
        let mut start = 0;
        for cut in cuts {
            chunks.push(bytes[start..cut].to_vec());
            start = cut;
        }
        chunks.push(bytes[start..].to_vec());
        Self::new(chunks)
    }
}

impl Read for ChunkedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.fail_reads {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"));
        }
        let Some(mut chunk) = self.chunks.pop_front() else {
            return Ok(0);
        };
        if chunk.len() > buf.len() {
            let rest = chunk.split_off(buf.len());
            self.chunks.push_front(rest);
        }
        buf[..chunk.len()].copy_from_slice(&chunk);
        Ok(chunk.len())
    }
}

impl Write for ChunkedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        }
        self.sent.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Server side: encode a MessagePack body and frame it.
pub fn server_frame<T: Serialize>(message_type: MessageType, value: &T) -> Vec<u8> {
    build_frame(message_type, &MsgPackCodec::encode(value).unwrap()).unwrap()
}

/// Server side: frame a HISTORY body the way the server does (zlib over MessagePack).
pub fn server_history_frame<T: Serialize>(value: &T) -> Vec<u8> {
    let body = MsgPackCodec::encode(value).unwrap();
    build_frame(MessageType::History, &ZlibCodec::compress(&body).unwrap()).unwrap()
}

/// Server side: split everything the client wrote into (header, body) pairs
/// and decode each body with the reference codec.
pub fn sent_frames(bytes: &[u8]) -> Vec<(Header, Vec<u8>)> {
    let mut frames = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        let header = Header::decode(rest).expect("truncated header in sent bytes");
        let total = header.total_len();
        frames.push((header, rest[HEADER_SIZE..total].to_vec()));
        rest = &rest[total..];
    }
    frames
}

pub fn peer_decode<T: DeserializeOwned>(body: &[u8]) -> T {
    MsgPackCodec::decode(body).unwrap()
}

/// Receive until EOF, draining after every read.
pub fn collect_all(client: &mut Client<ChunkedStream>) -> Vec<Message> {
    let mut messages = Vec::new();
    while client.receive().unwrap() > 0 {
        loop {
            match client.extract_next().unwrap() {
                ParseOutcome::Message(message) => messages.push(message),
                ParseOutcome::Pending => break,
                ParseOutcome::Disconnect(reason) => panic!("unexpected disconnect: {}", reason),
            }
        }
    }
    messages
}

pub fn client(stream: ChunkedStream) -> Client<ChunkedStream> {
    ClientBuilder::new().build(stream)
}
