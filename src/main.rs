use clap::Parser;
use mdelta::cli::Config;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = Config::parse();
    mdelta::cli::run(config)
}
