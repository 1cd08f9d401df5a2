use crate::core::RunConfig;
use clap::Parser;
use std::path::PathBuf;

/// Counts tokens in files using the cl100k_base encoding.
#[derive(Parser, Debug)]
#[command(
    name = "token-count",
    version,
    about = "Counts tokens in files",
    long_about = "token-count counts language-model tokens in files using a native tiktoken encoder and a pool of worker threads."
)]
pub struct CliArgs {
    /// Enable debug mode (logs the content of every file)
    #[arg(long)]
    pub debug: bool,

    /// Specify the log file
    #[arg(long = "log-file", value_name = "PATH", default_value = "")]
    pub log_file: String,

    /// Specify the number of threads to use (default: number of CPUs)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub threads: i64,

    /// Explore directories recursively
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Files or directories to count
    #[arg(required = true, value_name = "FILES")]
    pub paths: Vec<PathBuf>,
}

impl CliArgs {
    pub fn to_run_config(&self) -> RunConfig {
        RunConfig::new(self.debug, &self.log_file, self.threads, self.recursive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["token-count", "a.txt"]).unwrap();
        assert!(!args.debug);
        assert!(!args.recursive);
        assert_eq!(args.threads, 0);
        assert_eq!(args.log_file, "");
        assert_eq!(args.paths, vec![PathBuf::from("a.txt")]);
    }

    #[test]
    fn test_all_flags() {
        let args = CliArgs::try_parse_from([
            "token-count",
            "--debug",
            "--log-file",
            "run.log",
            "--threads",
            "3",
            "-r",
            "src",
            "README.md",
        ])
        .unwrap();
        let config = args.to_run_config();
        assert!(config.debug);
        assert!(config.recursive);
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.log_file, Some(PathBuf::from("run.log")));
        assert_eq!(args.paths.len(), 2);
    }

    #[test]
    fn test_negative_threads_fall_back_to_auto() {
        let args = CliArgs::try_parse_from(["token-count", "--threads", "-2", "a.txt"]).unwrap();
        assert_eq!(args.threads, -2);
        assert!(args.to_run_config().worker_count >= 1);
    }

    #[test]
    fn test_missing_paths_is_an_error() {
        let err = CliArgs::try_parse_from(["token-count", "--recursive"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
