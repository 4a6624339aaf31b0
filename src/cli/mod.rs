pub mod actions;
pub mod config;

use clap::{Arg, ArgMatches, Command};

/// Command line definition. Without a one-shot flag the TUI starts.
pub fn build_command() -> Command {
    Command::new("regpanel")
        .about("Read and edit device configuration registers through a serial backend")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML configuration file")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .short('b')
                .help("Backend base URL (default http://127.0.0.1:8080)")
                .value_name("URL"),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .help("Per-request timeout in milliseconds, 0 to disable")
                .value_name("MS")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Reject non-numeric register values instead of sending 0")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write logs to this file (TUI mode defaults to regpanel.log)")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("list-ports")
                .long("list-ports")
                .short('l')
                .help("List serial ports known to the backend and exit")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with_all(["read", "submit"]),
        )
        .arg(
            Arg::new("read")
                .long("read")
                .help("Confirm PORT, print its registers and exit")
                .value_name("PORT")
                .conflicts_with_all(["list-ports", "submit"]),
        )
        .arg(
            Arg::new("submit")
                .long("submit")
                .help("Confirm PORT, write --values to it and exit")
                .value_name("PORT")
                .requires("values")
                .conflicts_with_all(["list-ports", "read"]),
        )
        .arg(
            Arg::new("values")
                .long("values")
                .help("Comma-separated register values in device order; missing entries are sent as 0")
                .value_name("V0,V1,...")
                .value_delimiter(',')
                .num_args(1..)
                .requires("submit"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .short('j')
                .help("Output one-shot results in JSON format")
                .action(clap::ArgAction::SetTrue),
        )
}

/// Parse command line arguments and return ArgMatches.
pub fn parse_args() -> ArgMatches {
    build_command().get_matches()
}
