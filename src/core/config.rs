/*
 * Run configuration for a single token counting batch. The configuration is built
 * once from the parsed command line and then handed by reference to the output
 * sink, the discovery step and the worker pool. Nothing downstream reads flags
 * from global state.
 *
 * This module also defines `ConfigError`, the only error class that is fatal:
 * it is raised before any file is processed.
 */
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    LogFile { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LogFile { path, source } => {
                write!(f, "cannot open {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::LogFile { source, .. } => Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/*
 * Immutable settings for one run.
 * `worker_count` is already resolved and always at least 1.
 * `log_file` of `None` means output goes to standard output.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub debug: bool,
    pub log_file: Option<PathBuf>,
    pub worker_count: usize,
    pub recursive: bool,
}

impl RunConfig {
    /*
     * Builds a configuration from raw flag values. An empty `log_file` selects
     * standard output and a non-positive `requested_threads` selects one worker
     * per logical CPU.
     */
    pub fn new(debug: bool, log_file: &str, requested_threads: i64, recursive: bool) -> Self {
        let log_file = if log_file.is_empty() {
            None
        } else {
            Some(PathBuf::from(log_file))
        };
        RunConfig {
            debug,
            log_file,
            worker_count: resolve_worker_count(requested_threads),
            recursive,
        }
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

pub fn resolve_worker_count(requested_threads: i64) -> usize {
    if requested_threads <= 0 {
        let detected = num_cpus::get().max(1);
        log::trace!("RunConfig: Auto-detected {detected} logical CPUs for the worker pool.");
        detected
    } else {
        usize::try_from(requested_threads).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_thread_count_is_used_as_is() {
        assert_eq!(resolve_worker_count(3), 3);
        assert_eq!(resolve_worker_count(1), 1);
    }

    #[test]
    fn test_non_positive_thread_count_uses_cpu_count() {
        let cpus = num_cpus::get().max(1);
        assert_eq!(resolve_worker_count(0), cpus);
        assert_eq!(resolve_worker_count(-4), cpus);
    }

    #[test]
    fn test_empty_log_file_means_standard_output() {
        let config = RunConfig::new(false, "", 2, true);
        assert_eq!(config.log_file(), None);
        assert_eq!(config.worker_count, 2);
        assert!(config.recursive);
        assert!(!config.debug);
    }

    #[test]
    fn test_log_file_path_is_kept() {
        let config = RunConfig::new(true, "out/run.log", 0, false);
        assert_eq!(config.log_file(), Some(Path::new("out/run.log")));
        assert!(config.worker_count >= 1);
    }

    #[test]
    fn test_log_file_error_display_includes_path() {
        let err = ConfigError::LogFile {
            path: PathBuf::from("/nowhere/run.log"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such directory"),
        };
        assert_eq!(
            err.to_string(),
            "cannot open /nowhere/run.log: no such directory"
        );
    }
}
