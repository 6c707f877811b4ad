//! Drives the command-line program.

use crate::markdown_to_delta;
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use log::debug;
use std::process::ExitCode;

/// Program configuration.
#[derive(Debug, Parser)]
#[command(version)]
#[command(about = "Converts Markdown into a Quill-style rich-text delta", long_about = None)]
pub struct Config {
    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,

    /// Markdown source to convert
    markdown: String,
}

impl Config {
    pub fn verbosity(&self) -> Verbosity<WarnLevel> {
        self.verbosity
    }

    pub fn pretty(&self) -> bool {
        self.pretty
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }
}

/// Sets up logging to stderr.
///
/// `RUST_LOG` is honored, but a verbosity flag given on the command line
/// takes precedence over it.
fn init_logging(verbosity: &Verbosity<WarnLevel>) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbosity.is_present() || std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(verbosity.log_level_filter());
    }
    let _ = builder.try_init();
}

/// Runs the command-line program using the given `config`.
///
/// The delta is written to stdout. Conversion problems are logged and still
/// produce a delta; only a failure to serialize the delta is fatal.
pub fn run(config: Config) -> ExitCode {
    init_logging(&config.verbosity());
    debug!("converting {} bytes of markdown", config.markdown().len());

    let delta = markdown_to_delta(config.markdown());
    match delta.to_json(config.pretty()) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("could not serialize delta: {err}");
            ExitCode::FAILURE
        }
    }
}
