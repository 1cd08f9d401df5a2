/*
 * This module consolidates the platform-agnostic logic of token-count: run
 * configuration, file discovery, the tokenizer service, the guarded output sink
 * and the worker pool that ties them together.
 */
pub mod config;
pub mod file_system;
pub mod models;
pub mod number_format;
pub mod output_sink;
pub mod tokenizer_utils;
pub mod worker_pool;

pub use config::RunConfig;

pub use file_system::{CoreFileDiscovery, DiscoveryReport, FileDiscoveryOperations};

pub use number_format::format_number;

pub use output_sink::{OutputSink, SinkLineWriter};

pub use tokenizer_utils::{CoreTikTokenProvider, TokenCounterProvider};

pub use worker_pool::{PoolReport, TokenWorkerPool};
