use std::process::ExitCode;

use clap::Parser;
use gocov_aggregate::{normalize_args, run, Cli, LogOptions};

fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    let options = cli.into_options(LogOptions::from_env());

    match run(&options) {
        Ok(summary) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
