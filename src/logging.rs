//! Logging initialization for token-count.
//!
//! All log records are routed into the run's `OutputSink`, so diagnostics land in
//! the same place as the per-file result lines: standard output, or the file
//! given with `--log-file`.

use std::sync::Arc;

use log::LevelFilter;
use simplelog::{Config, ConfigBuilder, WriteLogger};
use time::macros::format_description;

use crate::core::{OutputSink, RunConfig, SinkLineWriter};

/// Installs the global logger. `--debug` lowers the level to `Debug`.
pub fn initialize(config: &RunConfig, sink: Arc<OutputSink>) {
    let level = if config.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    if let Err(err) = WriteLogger::init(level, build_config(), SinkLineWriter::new(sink)) {
        eprintln!("Warning: Could not initialize logging: {err}");
    }
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_custom(format_description!(
            "[year]/[month]/[day] [hour]:[minute]:[second]"
        ))
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build()
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
#[cfg(test)]
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, TermLogger, TerminalMode};

    let _ = TermLogger::init(
        LevelFilter::Debug,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
}
