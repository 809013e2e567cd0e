mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "netframe",
    version,
    about = "Build and inspect netframe captures"
)]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "text",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "warn",
        env = "NETFRAME_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from([
            "netframe",
            "encode",
            "--cmd",
            "7",
            "--uid",
            "42",
            "--err-code",
            "-1",
            "--reserved",
            "1,2,3,4",
            "--data",
            "abc",
        ])
        .expect("encode args should parse");

        match cli.command {
            Command::Encode(args) => {
                assert_eq!(args.cmd, 7);
                assert_eq!(args.uid, 42);
                assert_eq!(args.err_code, -1);
                assert_eq!(args.reserved, Some(vec![1, 2, 3, 4]));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_body_args() {
        let err = Cli::try_parse_from([
            "netframe",
            "encode",
            "--data",
            "hello",
            "--file",
            "/tmp/body.bin",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_decode_subcommand() {
        let cli = Cli::try_parse_from([
            "netframe",
            "--format",
            "json",
            "decode",
            "/tmp/capture.bin",
            "--max-body-size",
            "128",
            "--count",
            "2",
        ])
        .expect("decode args should parse");

        match cli.command {
            Command::Decode(args) => {
                assert_eq!(args.max_body_size, 128);
                assert_eq!(args.count, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_info_subcommand() {
        let cli = Cli::try_parse_from(["netframe", "info"]).expect("info args should parse");
        assert!(matches!(cli.command, Command::Info(_)));
    }
}
