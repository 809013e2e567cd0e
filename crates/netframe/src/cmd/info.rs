use netframe_frame::{HEADER_SIZE, MAGIC, MAX_BODY_SIZE, MAX_SIZE, WIRE_HEADER_SIZE};
use serde::Serialize;

use crate::cmd::InfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct FieldInfo {
    name: &'static str,
    offset: usize,
    size: usize,
}

#[derive(Serialize)]
struct InfoOutput {
    magic: String,
    byte_order: &'static str,
    max_size: u32,
    header_size: u32,
    wire_header_size: usize,
    max_body_size: u32,
    fields: Vec<FieldInfo>,
}

const FIELDS: [(&str, usize); 9] = [
    ("magic", 4),
    ("cmd", 4),
    ("ctx", 8),
    ("uid", 8),
    ("err_code", 4),
    ("body_size", 4),
    ("reserved", 16),
    ("body_size", 4),
    ("body", 0),
];

pub fn run(_args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    print_info(&collect(), format);
    Ok(SUCCESS)
}

fn collect() -> InfoOutput {
    let mut offset = 0usize;
    let fields = FIELDS
        .iter()
        .map(|&(name, size)| {
            let field = FieldInfo { name, offset, size };
            offset += size;
            field
        })
        .collect();

    InfoOutput {
        magic: format!("{MAGIC:#010x}"),
        byte_order: "little-endian",
        max_size: MAX_SIZE,
        header_size: HEADER_SIZE,
        wire_header_size: WIRE_HEADER_SIZE,
        max_body_size: MAX_BODY_SIZE,
        fields,
    }
}

fn print_info(out: &InfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("Wire Format:");
            println!("  Magic:            {}", out.magic);
            println!("  Byte order:       {}", out.byte_order);
            println!("  Header (wire):    {} bytes", out.wire_header_size);
            println!("  Header (budget):  {} bytes", out.header_size);
            println!("  Max body:         {} bytes", out.max_body_size);
            println!("  Layout:");
            for field in &out.fields {
                if field.size == 0 {
                    println!(
                        "    {:>3}  {:<10} (body_size bytes)",
                        field.offset, field.name
                    );
                } else {
                    println!(
                        "    {:>3}  {:<10} {} bytes",
                        field.offset, field.name, field.size
                    );
                }
            }
        }
        OutputFormat::Raw => {
            println!("{}", out.magic);
        }
    }
}
