use std::io::Read;
use std::net::TcpStream;

use tracing::debug;

use crate::codec::{Frame, FrameConfig, WIRE_HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Reads complete frames from any `Read` stream.
///
/// Keeps a running count of the bytes consumed from the stream, including
/// bytes consumed by frames that failed to decode.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
    bytes_read: u64,
    failed: bool,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            config,
            bytes_read: 0,
            failed: false,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// A stream that ends before a complete frame, including one that ends
    /// cleanly between frames, is reported as an `UnexpectedEof` I/O error.
    pub fn read_frame(&mut self) -> Result<Frame> {
        let limit = self.config.effective_max_body_size();
        match Frame::read_from_limited(&mut self.inner, limit) {
            Ok((n, frame)) => {
                self.bytes_read += n;
                Ok(frame)
            }
            Err(err) => {
                // Header rejections happen once the whole wire header is in.
                self.bytes_read += err.transferred().unwrap_or(WIRE_HEADER_SIZE as u64);
                Err(err)
            }
        }
    }

    /// Read the next frame, or `Ok(None)` if the stream ended exactly on a
    /// frame boundary.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.read_frame() {
            Ok(frame) => Ok(Some(frame)),
            Err(err) if err.is_unexpected_eof() && err.transferred() == Some(0) => {
                debug!(
                    bytes_read = self.bytes_read,
                    "stream closed at frame boundary"
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Total bytes consumed from the stream so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum body size for subsequent frame decoding.
    pub fn set_max_body_size(&mut self, max_body_size: u32) {
        self.config.max_body_size = max_body_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<Frame>;

    /// Yields frames until the stream ends on a frame boundary. The first
    /// error is yielded once and ends iteration: the stream position is no
    /// longer on a frame boundary and nothing resynchronizes it.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_frame().transpose();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

impl FrameReader<TcpStream> {
    /// Create a frame reader for a `TcpStream` and apply read timeout from config.
    pub fn with_config_tcp(inner: TcpStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(FrameError::from)?;
        Ok(Self::with_config(inner, config))
    }
}
