use std::fmt;
use std::io;

use netframe_frame::FrameError;

// Exit code constants aligned with sysexits-style semantics.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

fn io_exit_code(kind: io::ErrorKind) -> i32 {
    match kind {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => FAILURE,
        _ => INTERNAL,
    }
}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_exit_code(err.kind()), format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    let code = match &err {
        // A capture that stops mid-frame is malformed input, not an I/O fault.
        FrameError::Io { source, .. } if source.kind() == io::ErrorKind::UnexpectedEof => {
            DATA_INVALID
        }
        FrameError::Io { source, .. } => io_exit_code(source.kind()),
        FrameError::MagicMismatch { .. }
        | FrameError::BodySizeTooLarge { .. }
        | FrameError::BodySizeExceedsBuffer { .. } => DATA_INVALID,
    };
    CliError::new(code, format!("{context}: {err}"))
}
