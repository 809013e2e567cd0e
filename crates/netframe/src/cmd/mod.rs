use clap::{Args, Subcommand};
use std::path::PathBuf;

use netframe_frame::MAX_BODY_SIZE;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod info;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a single frame to a file or stdout.
    Encode(EncodeArgs),
    /// Decode and print the frames in a capture.
    Decode(DecodeArgs),
    /// Print the wire format constants.
    Info(InfoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Command identifier.
    #[arg(long, default_value_t = 0)]
    pub cmd: u32,
    /// Context/correlation identifier.
    #[arg(long, default_value_t = 0)]
    pub ctx: u64,
    /// User/session identifier.
    #[arg(long, default_value_t = 0)]
    pub uid: u64,
    /// Status code.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub err_code: i32,
    /// Four reserved words (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "A,B,C,D")]
    pub reserved: Option<Vec<u32>>,
    /// Raw string body.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read body from file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
    /// Write the frame here instead of stdout.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file to read. Reads stdin when omitted or "-".
    pub input: Option<PathBuf>,
    /// Reject frames whose body exceeds this many bytes.
    #[arg(
        long,
        default_value_t = MAX_BODY_SIZE,
        env = "NETFRAME_MAX_BODY_SIZE"
    )]
    pub max_body_size: u32,
    /// Stop after N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct InfoArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
