/*
 * The bounded-parallel tokenization pipeline. `TokenWorkerPool` takes the complete
 * list of discovered files, places it in a closed job queue and lets a fixed number
 * of worker threads pull from it. Each worker reads a file, counts its tokens with
 * its own counter and writes the result line to the shared `OutputSink`. Results
 * travel back to the coordinator over a channel; the coordinator only reads them
 * after every worker has been joined, so the total needs no locking.
 *
 * Per-file failures (unreadable file, tokenizer unavailable, encoding error) are
 * logged and recorded in the result for that file. They never stop a worker.
 */
use crate::core::config::RunConfig;
use crate::core::models::{FileJob, FileProcessingError, FileTokenResult, file_result_line};
use crate::core::output_sink::OutputSink;
use crate::core::tokenizer_utils::{TokenCounterOperations, TokenCounterProvider, TokenizerError};
use crossbeam_channel::{Receiver, Sender};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

/*
 * Lifecycle of a pool. Transitions only move forward:
 * Idle -> Populating (queue filled) -> Draining (workers active, queue closed) -> Done.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PoolState {
    Idle,
    Populating,
    Draining,
    Done,
}

/*
 * Everything the coordinator collected once the barrier was reached.
 */
#[derive(Debug, Default)]
pub struct PoolReport {
    pub results: Vec<FileTokenResult>,
    pub workers_spawned: usize,
}

impl PoolReport {
    /*
     * Sum of token counts over successful results. Failed files are excluded.
     */
    pub fn total_tokens(&self) -> usize {
        self.results
            .iter()
            .filter_map(FileTokenResult::token_count)
            .sum()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

pub struct TokenWorkerPool {
    worker_count: usize,
    debug: bool,
    provider: Arc<dyn TokenCounterProvider>,
    sink: Arc<OutputSink>,
    state: PoolState,
}

impl TokenWorkerPool {
    pub fn new(
        config: &RunConfig,
        provider: Arc<dyn TokenCounterProvider>,
        sink: Arc<OutputSink>,
    ) -> Self {
        TokenWorkerPool {
            worker_count: config.worker_count.max(1),
            debug: config.debug,
            provider,
            sink,
            state: PoolState::Idle,
        }
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    fn transition(&mut self, next: PoolState) {
        debug_assert!(next > self.state, "pool state cannot move back to {next:?}");
        log::trace!("TokenWorkerPool: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /*
     * Processes the whole batch and blocks until every worker has finished.
     *
     * The queue is fully populated and closed before the first worker starts, so a
     * worker that finds it empty terminates instead of waiting. At most one worker
     * per file is started; an empty batch starts none. If no worker thread can be
     * spawned the coordinator drains the queue itself.
     */
    pub fn run(mut self, paths: Vec<PathBuf>) -> PoolReport {
        self.transition(PoolState::Populating);
        let job_count = paths.len();
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<FileJob>();
        for path in paths {
            // The coordinator still holds `job_rx`, so the queue cannot be disconnected here.
            if let Err(err) = job_tx.send(FileJob::new(path)) {
                log::error!(
                    "TokenWorkerPool: Failed to enqueue {:?}.",
                    err.into_inner().path()
                );
            }
        }
        drop(job_tx);

        self.transition(PoolState::Draining);
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<FileTokenResult>();
        let target_workers = self.worker_count.min(job_count);
        let mut handles = Vec::with_capacity(target_workers);
        for worker_index in 0..target_workers {
            let worker = self.make_worker(worker_index, job_rx.clone(), result_tx.clone());
            let spawn_result = thread::Builder::new()
                .name(format!("token-worker-{worker_index}"))
                .spawn(move || worker.run());
            match spawn_result {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    log::error!("TokenWorkerPool: Failed to spawn worker {worker_index}: {err}");
                }
            }
        }
        let workers_spawned = handles.len();
        log::debug!(
            "TokenWorkerPool: {workers_spawned} workers draining {job_count} jobs."
        );

        if workers_spawned == 0 && job_count > 0 {
            log::warn!("TokenWorkerPool: No worker threads available, processing on the calling thread.");
            self.make_worker(0, job_rx.clone(), result_tx.clone()).run();
        }
        drop(job_rx);
        drop(result_tx);

        for handle in handles {
            let name = handle.thread().name().unwrap_or("token-worker").to_string();
            if handle.join().is_err() {
                log::error!("TokenWorkerPool: Worker {name} panicked; its in-flight file was not counted.");
            }
        }

        // Every sender is gone once the workers are joined, so this drains and ends.
        let results: Vec<FileTokenResult> = result_rx.iter().collect();
        self.transition(PoolState::Done);

        let report = PoolReport {
            results,
            workers_spawned,
        };
        log::debug!(
            "TokenWorkerPool: Done. {} files counted, {} failed, {} tokens.",
            report.succeeded(),
            report.failed(),
            report.total_tokens()
        );
        report
    }

    fn make_worker(
        &self,
        id: usize,
        jobs: Receiver<FileJob>,
        results: Sender<FileTokenResult>,
    ) -> Worker {
        Worker {
            id,
            jobs,
            results,
            provider: Arc::clone(&self.provider),
            sink: Arc::clone(&self.sink),
            debug: self.debug,
            counter: None,
        }
    }
}

struct Worker {
    id: usize,
    jobs: Receiver<FileJob>,
    results: Sender<FileTokenResult>,
    provider: Arc<dyn TokenCounterProvider>,
    sink: Arc<OutputSink>,
    debug: bool,
    // Created on the first job and kept for the worker's lifetime.
    counter: Option<Result<Box<dyn TokenCounterOperations>, TokenizerError>>,
}

impl Worker {
    fn run(mut self) {
        let mut processed = 0usize;
        while let Ok(job) = self.jobs.recv() {
            let result = self.process(job);
            processed += 1;
            if self.results.send(result).is_err() {
                log::error!("TokenWorkerPool: Worker {} lost its result channel.", self.id);
                break;
            }
        }
        log::trace!("TokenWorkerPool: Worker {} finished after {processed} jobs.", self.id);
    }

    fn process(&mut self, job: FileJob) -> FileTokenResult {
        let path = job.path().to_path_buf();
        let outcome = self.count_file(&job);
        FileTokenResult { path, outcome }
    }

    fn count_file(&mut self, job: &FileJob) -> Result<usize, FileProcessingError> {
        let path = job.path();
        let bytes = fs::read(path).map_err(|e| {
            log::error!("Error reading file {}: {e}", path.display());
            FileProcessingError::Read(e)
        })?;
        let content = String::from_utf8_lossy(&bytes);

        if self.debug {
            self.emit(&format!("File: {}, Content: {content}", path.display()));
        }

        let counter = self.counter().map_err(|e| {
            log::error!("Error getting encoding: {e}");
            FileProcessingError::TokenizerInit(e)
        })?;
        let token_count = counter.count_tokens(&content).map_err(|e| {
            log::error!("Error encoding {}: {e}", path.display());
            FileProcessingError::Encode(e)
        })?;

        self.emit(&file_result_line(path, token_count));
        Ok(token_count)
    }

    fn counter(&mut self) -> Result<&dyn TokenCounterOperations, TokenizerError> {
        let provider = &self.provider;
        let slot = self.counter.get_or_insert_with(|| provider.create_counter());
        match slot {
            Ok(counter) => Ok(&**counter),
            Err(e) => Err(e.clone()),
        }
    }

    fn emit(&self, line: &str) {
        if let Err(e) = self.sink.write_line(line) {
            log::warn!("TokenWorkerPool: Worker {} failed to write output: {e}", self.id);
        }
    }
}
