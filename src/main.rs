//! parallel-mcp binary entry point.

use std::process::ExitCode;

use clap::Parser;

use parallel_mcp::cli::{Cli, execute};
use parallel_mcp::logging::{LogConfig, init_tracing};

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig::new(cli.verbose, cli.log_json, cli.log_dir.clone());
    if let Err(e) = init_tracing(&log_config) {
        eprintln!("Error: cannot open log directory: {e}");
        return ExitCode::FAILURE;
    }

    match execute(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                print!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
