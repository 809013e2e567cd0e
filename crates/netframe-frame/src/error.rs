/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame header does not start with the expected magic number.
    #[error("invalid frame magic (expected {expected:#010x}, got {actual:#010x})")]
    MagicMismatch { expected: u32, actual: u32 },

    /// The declared body size exceeds the allowed maximum.
    #[error("body size too large ({actual} bytes, max {max})")]
    BodySizeTooLarge { max: u32, actual: u32 },

    /// The declared body size is larger than the body buffer it describes.
    #[error("body size {body_size} is larger than body buffer ({buffer_len} bytes)")]
    BodySizeExceedsBuffer { body_size: u32, buffer_len: usize },

    /// An I/O error occurred while reading or writing a frame.
    ///
    /// `transferred` counts the bytes moved through the stream before the
    /// failure, so callers can account for a partially consumed or partially
    /// written frame.
    #[error("frame I/O error after {transferred} bytes: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        transferred: u64,
    },
}

impl FrameError {
    /// Bytes transferred before an I/O failure.
    ///
    /// Validation errors carry no count: encode rejects them before writing
    /// anything, and decode rejects them right after the wire header.
    pub fn transferred(&self) -> Option<u64> {
        match self {
            FrameError::Io { transferred, .. } => Some(*transferred),
            _ => None,
        }
    }

    /// Whether the stream ended before a complete frame was transferred.
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(
            self,
            FrameError::Io { source, .. } if source.kind() == std::io::ErrorKind::UnexpectedEof
        )
    }

    /// Whether this is a header or buffer validation error rather than an I/O failure.
    pub fn is_validation(&self) -> bool {
        !matches!(self, FrameError::Io { .. })
    }
}

impl From<std::io::Error> for FrameError {
    fn from(source: std::io::Error) -> Self {
        FrameError::Io {
            source,
            transferred: 0,
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
