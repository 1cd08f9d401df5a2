use crate::core::{
    DiscoveryReport, FileDiscoveryOperations, OutputSink, PoolReport, RunConfig,
    TokenCounterProvider, TokenWorkerPool, format_number,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

/*
 * Drives one token counting run: discovery, then the worker pool, then the
 * summary the caller prints. The collaborators are injected as trait objects so
 * tests can swap the tokenizer for a deterministic one.
 */
pub struct TokenCountRunner {
    config: RunConfig,
    discovery: Arc<dyn FileDiscoveryOperations>,
    provider: Arc<dyn TokenCounterProvider>,
    sink: Arc<OutputSink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total_tokens: usize,
    pub files_counted: usize,
    pub files_failed: usize,
    pub discovery_errors: usize,
}

impl TokenCountRunner {
    pub fn new(
        config: RunConfig,
        discovery: Arc<dyn FileDiscoveryOperations>,
        provider: Arc<dyn TokenCounterProvider>,
        sink: Arc<OutputSink>,
    ) -> Self {
        TokenCountRunner {
            config,
            discovery,
            provider,
            sink,
        }
    }

    pub fn run(&self, inputs: &[PathBuf]) -> RunSummary {
        log::debug!(
            "TokenCountRunner: Starting with {} inputs, {} workers, recursive = {}.",
            inputs.len(),
            self.config.worker_count,
            self.config.recursive
        );
        let discovery = self.discovery.discover(inputs, self.config.recursive);
        let discovery_errors = report_discovery(&discovery);

        let pool = TokenWorkerPool::new(
            &self.config,
            Arc::clone(&self.provider),
            Arc::clone(&self.sink),
        );
        log::trace!("TokenCountRunner: Pool created in state {:?}.", pool.state());
        let pool_report: PoolReport = pool.run(discovery.files);

        log::debug!(
            "TokenCountRunner: Pool used {} workers for {} files.",
            pool_report.workers_spawned,
            pool_report.results.len()
        );
        for failed in &pool_report.results {
            if let Err(e) = &failed.outcome {
                log::debug!("TokenCountRunner: Not counted {}: {e}", failed.path.display());
            }
        }

        if let Err(e) = self.sink.flush() {
            log::warn!("TokenCountRunner: Failed to flush output: {e}");
        }

        RunSummary {
            total_tokens: pool_report.total_tokens(),
            files_counted: pool_report.succeeded(),
            files_failed: pool_report.failed(),
            discovery_errors,
        }
    }
}

fn report_discovery(report: &DiscoveryReport) -> usize {
    for error in &report.errors {
        log::error!("{error}");
    }
    for directory in &report.skipped_directories {
        log::info!(
            "Skipping directory {} (use --recursive to process)",
            directory.display()
        );
    }
    report.errors.len()
}

/*
 * Prints the separator line and the formatted total.
 */
pub fn write_total(out: &mut dyn Write, total_tokens: usize) -> io::Result<()> {
    writeln!(out, "__")?;
    writeln!(out, "Total token count: {} tks", format_number(total_tokens))?;
    out.flush()
}
