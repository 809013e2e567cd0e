use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use netframe_frame::Frame;
use serde::Serialize;

const PREVIEW_LIMIT: usize = 64;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput {
    index: usize,
    offset: u64,
    magic: String,
    cmd: u32,
    ctx: u64,
    uid: u64,
    err_code: i32,
    body_size: u32,
    reserved: [u32; 4],
    wire_size: usize,
    body: String,
}

impl FrameOutput {
    fn new(frame: &Frame, index: usize, offset: u64) -> Self {
        Self {
            index,
            offset,
            magic: format!("{:#010x}", frame.magic),
            cmd: frame.cmd,
            ctx: frame.ctx,
            uid: frame.uid,
            err_code: frame.err_code,
            body_size: frame.body_size,
            reserved: frame.reserved,
            wire_size: frame.wire_size(),
            body: body_preview(frame.body()),
        }
    }
}

/// Print one decoded frame; `offset` is where it starts in the capture.
pub fn print_frame(frame: &Frame, index: usize, offset: u64, format: OutputFormat) {
    let out = FrameOutput::new(frame, index, offset);
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "#", "OFFSET", "CMD", "CTX", "UID", "ERR", "SIZE", "BODY",
                ])
                .add_row(vec![
                    out.index.to_string(),
                    out.offset.to_string(),
                    out.cmd.to_string(),
                    out.ctx.to_string(),
                    out.uid.to_string(),
                    out.err_code.to_string(),
                    out.body_size.to_string(),
                    out.body.clone(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "#{} @{} cmd={} ctx={} uid={} err={} size={} reserved={:?} body={}",
                out.index,
                out.offset,
                out.cmd,
                out.ctx,
                out.uid,
                out.err_code,
                out.body_size,
                out.reserved,
                out.body
            );
        }
        OutputFormat::Raw => {
            print_raw(frame.body());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Printable rendering of a body: text when it is short UTF-8, otherwise
/// a hex prefix.
pub fn body_preview(body: &[u8]) -> String {
    match std::str::from_utf8(body) {
        Ok(text) if body.len() <= PREVIEW_LIMIT && !text.chars().any(char::is_control) => {
            text.to_string()
        }
        _ => {
            let shown = &body[..body.len().min(PREVIEW_LIMIT / 4)];
            let hex: String = shown.iter().map(|b| format!("{b:02x}")).collect();
            if shown.len() < body.len() {
                format!("<binary {} bytes: {hex}..>", body.len())
            } else {
                format!("<binary {} bytes: {hex}>", body.len())
            }
        }
    }
}
