mod cmd;
mod exit;
mod logging;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "dlcap", version, about = "DLPI packet capture CLI")]
struct Cli {
    /// Log output format (stderr).
    #[arg(
        long,
        value_name = "FORMAT",
        default_value = "text",
        env = "DLCAP_LOG_FORMAT",
        global = true
    )]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "DLCAP_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match cmd::run(cli.command) {
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
    fn parses_capture_subcommand() {
        let cli = Cli::try_parse_from([
            "dlcap", "capture", "bge0", "--snaplen", "1500", "--promisc", "--count", "10",
        ])
        .expect("capture args should parse");

        match cli.command {
            Command::Capture(args) => {
                assert_eq!(args.device, "bge0");
                assert_eq!(args.snaplen, 1500);
                assert!(args.promisc);
                assert_eq!(args.count, Some(10));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn snaplen_defaults_to_everything() {
        let cli = Cli::try_parse_from(["dlcap", "capture", "lan0:1"]).unwrap();
        match cli.command {
            Command::Capture(args) => {
                assert_eq!(args.snaplen, 0);
                assert!(!args.promisc);
                assert!(!args.monitor);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_inject_subcommand() {
        let cli = Cli::try_parse_from(["dlcap", "inject", "bge0", "--hex", "ffffffffffff"])
            .expect("inject args should parse");
        assert!(matches!(cli.command, Command::Inject(_)));
    }

    #[test]
    fn parses_devices_subcommand() {
        let cli = Cli::try_parse_from(["dlcap", "devices"]).unwrap();
        assert!(matches!(cli.command, Command::Devices(_)));
    }
}
