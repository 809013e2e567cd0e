use std::fs::{self, File};
use std::io::{self, BufWriter, Write};

use bytes::Bytes;
use netframe_frame::{Frame, FrameWriter};
use serde::Serialize;

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct EncodeOutput<'a> {
    path: &'a str,
    bytes_written: u64,
    body_size: u32,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = build_frame(&args)?;

    let Some(path) = &args.output else {
        let stdout = io::stdout();
        let written = write_frame(stdout.lock(), &frame)?;
        tracing::info!(bytes_written = written, "encoded frame to stdout");
        return Ok(SUCCESS);
    };

    let file = File::create(path)
        .map_err(|err| {
            io_error(&format!("failed creating {}", path.display()), err)
        })?;
    let written = write_frame(BufWriter::new(file), &frame)?;
    tracing::info!(bytes_written = written, path = %path.display(), "encoded frame");

    let display = path.display().to_string();
    let out = EncodeOutput {
        path: &display,
        bytes_written: written,
        body_size: frame.body_size,
    };
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => println!(
            "wrote {} bytes ({} body) to {}",
            out.bytes_written, out.body_size, out.path
        ),
        OutputFormat::Raw => println!("{}", out.bytes_written),
    }

    Ok(SUCCESS)
}

fn build_frame(args: &EncodeArgs) -> CliResult<Frame> {
    let reserved = match &args.reserved {
        None => [0; 4],
        Some(words) => <[u32; 4]>::try_from(words.as_slice()).map_err(|_| {
            CliError::new(
                USAGE,
                format!("--reserved takes exactly 4 values, got {}", words.len()),
            )
        })?,
    };

    Ok(Frame {
        cmd: args.cmd,
        ctx: args.ctx,
        uid: args.uid,
        err_code: args.err_code,
        reserved,
        ..Frame::new()
    }
    .with_body(resolve_body(args)?))
}

fn resolve_body(args: &EncodeArgs) -> CliResult<Bytes> {
    if let Some(data) = &args.data {
        return Ok(Bytes::copy_from_slice(data.as_bytes()));
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map(Bytes::from)
            .map_err(|err| {
                io_error(&format!("failed reading {}", path.display()), err)
            });
    }
    Ok(Bytes::new())
}

fn write_frame<W: Write>(sink: W, frame: &Frame) -> CliResult<u64> {
    let mut writer = FrameWriter::new(sink);
    writer
        .write_frame(frame)
        .map_err(|err| frame_error("encode failed", err))?;
    Ok(writer.bytes_written())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::DATA_INVALID;

    fn args() -> EncodeArgs {
        EncodeArgs {
            cmd: 7,
            ctx: 1,
            uid: 42,
            err_code: -3,
            reserved: None,
            data: Some("abc".to_string()),
            file: None,
            output: None,
        }
    }

    #[test]
    fn builds_frame_from_args() {
        let frame = build_frame(&args()).unwrap();
        assert_eq!(frame.cmd, 7);
        assert_eq!(frame.ctx, 1);
        assert_eq!(frame.uid, 42);
        assert_eq!(frame.err_code, -3);
        assert_eq!(frame.reserved, [0; 4]);
        assert_eq!(frame.body_size, 3);
        assert_eq!(frame.body.as_ref(), b"abc");
    }

    #[test]
    fn reserved_needs_four_words() {
        let mut a = args();
        a.reserved = Some(vec![1, 2, 3, 4]);
        assert_eq!(build_frame(&a).unwrap().reserved, [1, 2, 3, 4]);

        a.reserved = Some(vec![1, 2]);
        assert_eq!(build_frame(&a).unwrap_err().code, USAGE);
    }

    #[test]
    fn writes_and_counts_bytes() {
        let frame = build_frame(&args()).unwrap();
        let mut sink = Vec::new();
        let written = write_frame(&mut sink, &frame).unwrap();
        assert_eq!(written, sink.len() as u64);
        assert_eq!(sink.len(), netframe_frame::WIRE_HEADER_SIZE + 3);
    }

    #[test]
    fn oversized_body_is_data_invalid() {
        let frame = Frame::new().with_body(vec![0u8; netframe_frame::MAX_BODY_SIZE as usize + 1]);
        let err = write_frame(Vec::new(), &frame).unwrap_err();
        assert_eq!(err.code, DATA_INVALID);
    }
}
