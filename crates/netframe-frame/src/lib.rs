//! Fixed-layout binary frame codec for request/response byte streams.
//!
//! Every frame is a 52-byte little-endian header followed by an opaque body:
//! - A 4-byte magic number (`0xdead9001`) for stream synchronization
//! - Command, context, user and status fields, uninterpreted by the codec
//! - A 4-byte body size, transmitted twice (the trailing copy wins)
//! - Up to [`MAX_BODY_SIZE`] body bytes
//!
//! Headers are validated before any body buffer is allocated, and every
//! transfer reports how many bytes crossed the stream, even on failure.

pub mod codec;
pub mod error;
pub mod reader;
mod stream;
#[cfg(feature = "async")]
pub mod tokio_codec;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, HEADER_SIZE, MAGIC, MAX_BODY_SIZE, MAX_SIZE,
    WIRE_HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
#[cfg(feature = "async")]
pub use tokio_codec::NetFrameCodec;
pub use writer::FrameWriter;
