use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use netframe_frame::{FrameConfig, FrameReader};

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let source = open_input(args.input.as_deref())?;
    let config = FrameConfig {
        max_body_size: args.max_body_size,
        ..FrameConfig::default()
    };
    let mut reader = FrameReader::with_config(BufReader::new(source), config);

    let decoded = decode_frames(&mut reader, args.count, |frame, index, offset| {
        print_frame(frame, index, offset, format)
    })?;
    tracing::info!(
        frames = decoded,
        bytes_read = reader.bytes_read(),
        "decode finished"
    );

    Ok(SUCCESS)
}

fn open_input(path: Option<&Path>) -> CliResult<Box<dyn Read>> {
    match path {
        None => Ok(Box::new(io::stdin().lock())),
        Some(path) if path.as_os_str() == "-" => Ok(Box::new(io::stdin().lock())),
        Some(path) => File::open(path)
            .map(|file| Box::new(file) as Box<dyn Read>)
            .map_err(|err| {
                io_error(&format!("failed opening {}", path.display()), err)
            }),
    }
}

/// Decode frames until the stream ends on a frame boundary or `limit` frames
/// have been seen. Returns the number of frames handed to `on_frame`.
fn decode_frames<R, F>(
    reader: &mut FrameReader<R>,
    limit: Option<usize>,
    mut on_frame: F,
) -> CliResult<usize>
where
    R: Read,
    F: FnMut(&netframe_frame::Frame, usize, u64),
{
    let mut index = 0usize;
    while limit.is_none_or(|max| index < max) {
        let offset = reader.bytes_read();
        match reader.next_frame() {
            Ok(Some(frame)) => {
                on_frame(&frame, index, offset);
                index += 1;
            }
            Ok(None) => break,
            Err(err) => {
                return Err(frame_error(
                    &format!("decode failed for frame #{index} at offset {offset}"),
                    err,
                ));
            }
        }
    }
    Ok(index)
}
