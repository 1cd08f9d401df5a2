/*
 * Plain data passed between discovery, the worker pool and the reporter.
 */
use crate::core::tokenizer_utils::TokenizerError;
use std::io;
use std::path::{Path, PathBuf};

/*
 * One file awaiting tokenization. A job is created during discovery and consumed
 * by exactly one worker.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileJob {
    path: PathBuf,
}

impl FileJob {
    pub fn new(path: PathBuf) -> Self {
        FileJob { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/*
 * Reasons a single file could not be counted. None of them stop the batch.
 */
#[derive(Debug)]
pub enum FileProcessingError {
    Read(io::Error),
    TokenizerInit(TokenizerError),
    Encode(TokenizerError),
}

impl std::fmt::Display for FileProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileProcessingError::Read(e) => write!(f, "read failed: {e}"),
            FileProcessingError::TokenizerInit(e) => write!(f, "tokenizer unavailable: {e}"),
            FileProcessingError::Encode(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for FileProcessingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileProcessingError::Read(e) => Some(e),
            FileProcessingError::TokenizerInit(e) | FileProcessingError::Encode(e) => Some(e),
        }
    }
}

#[derive(Debug)]
pub struct FileTokenResult {
    pub path: PathBuf,
    pub outcome: Result<usize, FileProcessingError>,
}

impl FileTokenResult {
    pub fn token_count(&self) -> Option<usize> {
        self.outcome.as_ref().ok().copied()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/*
 * The canonical per-file output line.
 */
pub fn file_result_line(path: &Path, token_count: usize) -> String {
    format!("File: {} ({token_count} tks)", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_result_line_format() {
        assert_eq!(
            file_result_line(Path::new("src/main.rs"), 42),
            "File: src/main.rs (42 tks)"
        );
    }

    #[test]
    fn test_failed_result_has_no_token_count() {
        let result = FileTokenResult {
            path: PathBuf::from("gone.txt"),
            outcome: Err(FileProcessingError::Read(io::Error::new(
                io::ErrorKind::NotFound,
                "vanished",
            ))),
        };
        assert!(!result.is_success());
        assert_eq!(result.token_count(), None);
        assert_eq!(
            result.outcome.unwrap_err().to_string(),
            "read failed: vanished"
        );
    }
}
