use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/*
 * This module expands the command line path arguments into the flat list of files
 * handed to the worker pool. Directories are walked with the `walkdir` crate when
 * recursion is enabled and skipped otherwise. Problems with individual paths do
 * not stop discovery: they are collected in the returned `DiscoveryReport` next
 * to the files that were found, and the caller decides how to report them.
 */

/*
 * Per-path discovery problems. `Stat` is raised for a command line argument that
 * cannot be inspected, `Walk` for an entry that fails during a recursive walk.
 */
#[derive(Debug)]
pub enum DiscoveryError {
    Stat { path: PathBuf, source: io::Error },
    Walk { path: PathBuf, source: walkdir::Error },
}

impl std::fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscoveryError::Stat { path, source } => {
                write!(f, "Error stating file {}: {source}", path.display())
            }
            DiscoveryError::Walk { path, source } => {
                write!(f, "Error accessing path {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiscoveryError::Stat { source, .. } => Some(source),
            DiscoveryError::Walk { source, .. } => Some(source),
        }
    }
}

/*
 * Outcome of discovery. `files` keeps argument order, with the entries of a walked
 * directory sorted by file name at each level.
 */
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub files: Vec<PathBuf>,
    pub errors: Vec<DiscoveryError>,
    pub skipped_directories: Vec<PathBuf>,
}

pub trait FileDiscoveryOperations: Send + Sync {
    fn discover(&self, inputs: &[PathBuf], recursive: bool) -> DiscoveryReport;
}

pub struct CoreFileDiscovery {}

impl CoreFileDiscovery {
    pub fn new() -> Self {
        CoreFileDiscovery {}
    }

    /*
     * Walks `root` and collects every entry that is not a directory. The walk does
     * not follow symbolic links; a link found inside the tree is listed as a file
     * and is resolved when the worker reads it. A failing entry is recorded and the
     * walk carries on with its siblings.
     */
    fn walk_directory(&self, root: &Path, report: &mut DiscoveryReport) {
        log::debug!("FileDiscovery: Walking directory {root:?}.");
        let walker = WalkDir::new(root).sort_by_file_name();
        for entry_result in walker {
            match entry_result {
                Ok(entry) => {
                    if !entry.file_type().is_dir() {
                        report.files.push(entry.into_path());
                    }
                }
                Err(err) => {
                    let path = err.path().unwrap_or(root).to_path_buf();
                    report.errors.push(DiscoveryError::Walk { path, source: err });
                }
            }
        }
    }
}

impl Default for CoreFileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl FileDiscoveryOperations for CoreFileDiscovery {
    fn discover(&self, inputs: &[PathBuf], recursive: bool) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        for input in inputs {
            let metadata = match fs::metadata(input) {
                Ok(metadata) => metadata,
                Err(source) => {
                    report.errors.push(DiscoveryError::Stat {
                        path: input.clone(),
                        source,
                    });
                    continue;
                }
            };

            if !metadata.is_dir() {
                report.files.push(input.clone());
            } else if recursive {
                self.walk_directory(input, &mut report);
            } else {
                report.skipped_directories.push(input.clone());
            }
        }
        log::debug!(
            "FileDiscovery: Found {} files ({} errors, {} directories skipped).",
            report.files.len(),
            report.errors.len(),
            report.skipped_directories.len()
        );
        report
    }
}
