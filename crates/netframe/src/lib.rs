//! Fixed-layout request/response framing for byte streams.
//!
//! # Crate Structure
//!
//! - [`frame`] — Frame type, wire constants, stream and buffer codecs
//!
//! The `netframe` binary (behind the `cli` feature) builds and inspects
//! frame captures offline.

/// Re-export frame types.
pub mod frame {
    pub use netframe_frame::*;
}

pub use netframe_frame::{Frame, FrameError, FrameReader, FrameWriter};
