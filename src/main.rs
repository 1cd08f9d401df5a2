// src/main.rs

mod app_logic;
mod cli;
mod core;
mod logging;

use crate::app_logic::{TokenCountRunner, write_total};
use crate::cli::CliArgs;
use crate::core::{CoreFileDiscovery, CoreTikTokenProvider, OutputSink};
use clap::Parser;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config = args.to_run_config();

    let sink = match OutputSink::for_config(&config) {
        Ok(sink) => Arc::new(sink),
        Err(err) => {
            eprintln!("Error opening log file: {err}");
            return ExitCode::FAILURE;
        }
    };
    logging::initialize(&config, Arc::clone(&sink));

    let runner = TokenCountRunner::new(
        config,
        Arc::new(CoreFileDiscovery::new()),
        Arc::new(CoreTikTokenProvider::new()),
        sink,
    );
    let summary = runner.run(&args.paths);
    log::debug!(
        "Main: {} files counted, {} failed, {} discovery errors.",
        summary.files_counted,
        summary.files_failed,
        summary.discovery_errors
    );

    // The total always goes to standard output, even when a log file is in use.
    if let Err(err) = write_total(&mut io::stdout().lock(), summary.total_tokens) {
        eprintln!("Error writing total: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
