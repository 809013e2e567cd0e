//! `tokio_util::codec` adapter for use with `Framed` streams.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

/// Frame codec for `tokio_util::codec::Framed`.
#[derive(Debug, Clone)]
pub struct NetFrameCodec {
    max_body_size: u32,
}

impl NetFrameCodec {
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    /// Only `max_body_size` is used; timeouts belong to the async runtime.
    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            max_body_size: config.effective_max_body_size(),
        }
    }

    pub fn max_body_size(&self) -> u32 {
        self.max_body_size
    }
}

impl Default for NetFrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for NetFrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        decode_frame(src, self.max_body_size)
    }
}

impl Encoder<Frame> for NetFrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        <Self as Encoder<&Frame>>::encode(self, &item, dst)
    }
}

impl Encoder<&Frame> for NetFrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &Frame, dst: &mut BytesMut) -> Result<()> {
        item.check_with_limit(self.max_body_size)?;
        encode_frame(item, dst)
    }
}
