use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::error::{FrameError, Result};

/// Magic number that opens every frame.
pub const MAGIC: u32 = 0xdead_9001;

/// Size budget of a whole frame (header + body).
pub const MAX_SIZE: u32 = 65536;

/// Declared header size.
///
/// Only [`WIRE_HEADER_SIZE`] bytes of header are actually transmitted. This
/// constant is kept because [`MAX_BODY_SIZE`] is derived from it and peers
/// enforce the same body limit.
pub const HEADER_SIZE: u32 = 104;

/// Largest body a frame may carry: 65432 bytes.
pub const MAX_BODY_SIZE: u32 = MAX_SIZE - HEADER_SIZE;

/// Header bytes transmitted ahead of the body.
///
/// magic (4) + cmd (4) + ctx (8) + uid (8) + err_code (4) + body_size (4)
/// + reserved (16) + body_size again (4) = 52 bytes.
pub const WIRE_HEADER_SIZE: usize = 52;

/// A request/response frame.
///
/// Every field except the body is opaque to the codec; only `magic` and
/// `body_size` are validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Format identifier, must equal [`MAGIC`].
    pub magic: u32,
    /// Command/type identifier.
    pub cmd: u32,
    /// Correlation/context identifier.
    pub ctx: u64,
    /// User/session identifier.
    pub uid: u64,
    /// Status code set by the application layer.
    pub err_code: i32,
    /// Number of body bytes that go on the wire.
    pub body_size: u32,
    /// Transmitted as-is.
    pub reserved: [u32; 4],
    /// Body buffer. Only the first `body_size` bytes are transmitted.
    pub body: Bytes,
}

impl Frame {
    /// Create an outgoing frame: magic preset, everything else zero.
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            ..Self::zeroed()
        }
    }

    /// An all-zero frame, populated field by field while decoding.
    pub(crate) fn zeroed() -> Self {
        Self {
            magic: 0,
            cmd: 0,
            ctx: 0,
            uid: 0,
            err_code: 0,
            body_size: 0,
            reserved: [0; 4],
            body: Bytes::new(),
        }
    }

    /// Replace the body and set `body_size` to its length.
    ///
    /// A body longer than `u32::MAX` saturates `body_size`, which
    /// [`check`](Self::check) then rejects as too large.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self.body_size = u32::try_from(self.body.len()).unwrap_or(u32::MAX);
        self
    }

    /// The body bytes that are transmitted: the first `body_size` bytes of
    /// the buffer, or the whole buffer if it is shorter.
    pub fn body(&self) -> &[u8] {
        let len = (self.body_size as usize).min(self.body.len());
        &self.body[..len]
    }

    /// The total wire size of this frame (header + body).
    pub fn wire_size(&self) -> usize {
        WIRE_HEADER_SIZE + self.body_size as usize
    }

    /// Validate magic and body size against [`MAX_BODY_SIZE`].
    pub fn check_header(&self) -> Result<()> {
        self.check_header_with_limit(MAX_BODY_SIZE)
    }

    /// Validate magic and body size against `max_body_size`.
    ///
    /// The limit can only tighten [`MAX_BODY_SIZE`], never raise it.
    pub fn check_header_with_limit(&self, max_body_size: u32) -> Result<()> {
        if self.magic != MAGIC {
            return Err(FrameError::MagicMismatch {
                expected: MAGIC,
                actual: self.magic,
            });
        }
        let max = max_body_size.min(MAX_BODY_SIZE);
        if self.body_size > max {
            return Err(FrameError::BodySizeTooLarge {
                max,
                actual: self.body_size,
            });
        }
        Ok(())
    }

    /// Full validation for an outgoing frame: header checks plus
    /// `body_size <= body.len()`.
    pub fn check(&self) -> Result<()> {
        self.check_with_limit(MAX_BODY_SIZE)
    }

    pub(crate) fn check_with_limit(&self, max_body_size: u32) -> Result<()> {
        self.check_header_with_limit(max_body_size)?;
        if self.body_size as usize > self.body.len() {
            return Err(FrameError::BodySizeExceedsBuffer {
                body_size: self.body_size,
                buffer_len: self.body.len(),
            });
        }
        Ok(())
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

/// Write the 52-byte wire header of `frame` into `dst`.
///
/// `body_size` is written twice, before and after the reserved words. Peers
/// expect both copies, so the layout is kept as is.
pub(crate) fn put_header<B: BufMut>(frame: &Frame, dst: &mut B) {
    dst.put_u32_le(frame.magic);
    dst.put_u32_le(frame.cmd);
    dst.put_u64_le(frame.ctx);
    dst.put_u64_le(frame.uid);
    dst.put_i32_le(frame.err_code);
    dst.put_u32_le(frame.body_size);
    for word in frame.reserved {
        dst.put_u32_le(word);
    }
    dst.put_u32_le(frame.body_size);
}

/// Parse a wire header into a frame with an empty body.
///
/// The trailing `body_size` copy overwrites the leading one.
pub(crate) fn parse_header(header: &[u8; WIRE_HEADER_SIZE]) -> Frame {
    let mut src: &[u8] = header;
    let mut frame = Frame::zeroed();
    frame.magic = src.get_u32_le();
    frame.cmd = src.get_u32_le();
    frame.ctx = src.get_u64_le();
    frame.uid = src.get_u64_le();
    frame.err_code = src.get_i32_le();
    frame.body_size = src.get_u32_le();
    for word in frame.reserved.iter_mut() {
        *word = src.get_u32_le();
    }
    let leading = frame.body_size;
    frame.body_size = src.get_u32_le();
    if leading != frame.body_size {
        debug!(
            leading,
            trailing = frame.body_size,
            "body size copies disagree, using trailing copy"
        );
    }
    frame
}

/// Encode a frame into the wire format.
///
/// Wire format (all fields little-endian):
/// ```text
/// offset  size  field
///      0     4  magic     (0xdead9001)
///      4     4  cmd
///      8     8  ctx
///     16     8  uid
///     24     4  err_code  (i32)
///     28     4  body_size
///     32    16  reserved  (4 x u32)
///     48     4  body_size (repeated, this copy wins on decode)
///     52     N  body      (body_size bytes)
/// ```
///
/// The frame is validated first; on failure `dst` is left untouched.
pub fn encode_frame(frame: &Frame, dst: &mut BytesMut) -> Result<()> {
    frame.check()?;
    dst.reserve(frame.wire_size());
    put_header(frame, dst);
    dst.put_slice(frame.body());
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// The header is validated as soon as it is buffered, so an oversized body
/// is rejected before any of it arrives. On success, consumes the frame bytes
/// from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_body_size: u32) -> Result<Option<Frame>> {
    if src.len() < WIRE_HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let mut header = [0u8; WIRE_HEADER_SIZE];
    header.copy_from_slice(&src[..WIRE_HEADER_SIZE]);
    let mut frame = parse_header(&header);

    if let Err(err) = frame.check_header_with_limit(max_body_size) {
        debug!(error = %err, "rejecting frame header");
        return Err(err);
    }

    let total = frame.wire_size();
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None); // Need more data
    }

    src.advance(WIRE_HEADER_SIZE);
    frame.body = src.split_to(frame.body_size as usize).freeze();

    Ok(Some(frame))
}

/// Configuration for frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum body size in bytes. Default: [`MAX_BODY_SIZE`].
    ///
    /// Values above [`MAX_BODY_SIZE`] have no effect.
    pub max_body_size: u32,
    /// Read timeout applied to the underlying stream, where supported.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout applied to the underlying stream, where supported.
    pub write_timeout: Option<std::time::Duration>,
}

impl FrameConfig {
    /// The body limit actually enforced.
    pub fn effective_max_body_size(&self) -> u32 {
        self.max_body_size.min(MAX_BODY_SIZE)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_body_size: MAX_BODY_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
