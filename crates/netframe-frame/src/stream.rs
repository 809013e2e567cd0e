//! Blocking frame transfer over `Read`/`Write` streams.
//!
//! Both directions go through a "sticky" helper: it counts every byte that
//! crosses the stream and remembers the first I/O error. Once an error is
//! recorded, later transfers are skipped and the error is reported together
//! with the byte count.

use std::io::{self, ErrorKind, Read, Write};

use bytes::Bytes;
use tracing::{debug, trace};

use crate::codec::{parse_header, put_header, Frame, MAX_BODY_SIZE, WIRE_HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Counting reader that stops after the first error.
pub(crate) struct StickyReader<R> {
    inner: R,
    count: u64,
    err: Option<io::Error>,
}

impl<R: Read> StickyReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            count: 0,
            err: None,
        }
    }

    /// Fill `buf` completely, unless an earlier read already failed.
    pub(crate) fn read_full(&mut self, buf: &mut [u8]) {
        if self.err.is_some() {
            return;
        }
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.err = Some(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        format!("stream ended after {filled} of {} bytes", buf.len()),
                    ));
                    return;
                }
                Ok(n) => {
                    filled += n;
                    self.count += n as u64;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.err = Some(err);
                    return;
                }
            }
        }
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }

    /// Surface the first recorded error, annotated with the byte count.
    pub(crate) fn check(&mut self) -> Result<()> {
        match self.err.take() {
            Some(source) => Err(FrameError::Io {
                source,
                transferred: self.count,
            }),
            None => Ok(()),
        }
    }
}

/// Counting writer that stops after the first error.
pub(crate) struct StickyWriter<W> {
    inner: W,
    count: u64,
    err: Option<io::Error>,
}

impl<W: Write> StickyWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self {
            inner,
            count: 0,
            err: None,
        }
    }

    /// Write all of `buf`, unless an earlier write already failed.
    pub(crate) fn write_full(&mut self, buf: &[u8]) {
        if self.err.is_some() {
            return;
        }
        let mut offset = 0usize;
        while offset < buf.len() {
            match self.inner.write(&buf[offset..]) {
                Ok(0) => {
                    self.err = Some(io::Error::new(
                        ErrorKind::WriteZero,
                        format!("stream accepted {offset} of {} bytes", buf.len()),
                    ));
                    return;
                }
                Ok(n) => {
                    offset += n;
                    self.count += n as u64;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.err = Some(err);
                    return;
                }
            }
        }
    }

    /// Total bytes written, or the first error with the bytes written before it.
    pub(crate) fn finish(mut self) -> Result<u64> {
        match self.err.take() {
            Some(source) => Err(FrameError::Io {
                source,
                transferred: self.count,
            }),
            None => Ok(self.count),
        }
    }
}

impl Frame {
    /// Read one frame from `reader`, enforcing [`MAX_BODY_SIZE`].
    ///
    /// Returns the number of bytes consumed together with the frame.
    ///
    /// On an I/O failure the error reports the bytes consumed so far (see
    /// [`FrameError::transferred`]). A magic or size rejection always happens
    /// after exactly [`WIRE_HEADER_SIZE`] bytes, and no body buffer is
    /// allocated for a rejected header.
    ///
    /// The whole header is pulled with one exact-length read and a non-empty
    /// body with a second one. Wrap unbuffered sources in a
    /// [`std::io::BufReader`] when reading many small frames.
    pub fn read_from<R: Read>(reader: R) -> Result<(u64, Frame)> {
        Self::read_from_limited(reader, MAX_BODY_SIZE)
    }

    /// Like [`read_from`](Self::read_from), with a tighter body limit.
    ///
    /// `max_body_size` above [`MAX_BODY_SIZE`] has no effect.
    pub fn read_from_limited<R: Read>(reader: R, max_body_size: u32) -> Result<(u64, Frame)> {
        let mut sr = StickyReader::new(reader);

        let mut header = [0u8; WIRE_HEADER_SIZE];
        sr.read_full(&mut header);
        sr.check()?;

        let mut frame = parse_header(&header);
        if let Err(err) = frame.check_header_with_limit(max_body_size) {
            debug!(error = %err, "rejecting frame header");
            return Err(err);
        }

        let mut body = vec![0u8; frame.body_size as usize];
        sr.read_full(&mut body);
        sr.check()?;
        frame.body = Bytes::from(body);

        trace!(
            cmd = frame.cmd,
            ctx = frame.ctx,
            uid = frame.uid,
            body_size = frame.body_size,
            "read frame"
        );
        Ok((sr.count(), frame))
    }

    /// Write this frame to `writer`.
    ///
    /// The frame is validated first; if validation fails nothing is written.
    /// Exactly `body_size` bytes of the body are sent. Returns the number of
    /// bytes written; on an I/O failure the error reports the bytes written
    /// before it. The writer is not flushed.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<u64> {
        self.check()?;
        self.write_unchecked(writer)
    }

    pub(crate) fn write_unchecked<W: Write>(&self, writer: W) -> Result<u64> {
        let mut header = [0u8; WIRE_HEADER_SIZE];
        let mut dst = &mut header[..];
        put_header(self, &mut dst);

        let mut sw = StickyWriter::new(writer);
        sw.write_full(&header);
        sw.write_full(self.body());
        let written = sw.finish()?;

        trace!(
            cmd = self.cmd,
            ctx = self.ctx,
            uid = self.uid,
            body_size = self.body_size,
            "wrote frame"
        );
        Ok(written)
    }
}
