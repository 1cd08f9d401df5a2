/*
 * The single output destination shared by all workers and by the logger.
 * `OutputSink` guards the underlying writer with a mutex and writes every line
 * as one unit, so result lines coming from concurrent workers are never torn or
 * interleaved. `SinkLineWriter` adapts the sink to the `Write` interface expected
 * by `simplelog`, forwarding only complete lines.
 */
use crate::core::config::{self, ConfigError, RunConfig};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

pub struct OutputSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl OutputSink {
    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        OutputSink {
            writer: Mutex::new(writer),
        }
    }

    pub fn stdout() -> Self {
        Self::from_writer(Box::new(io::stdout()))
    }

    /*
     * Opens the log file in append mode, creating it when absent.
     * Failure here is a fatal configuration error.
     */
    pub fn open_log_file(path: &Path) -> config::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ConfigError::LogFile {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_writer(Box::new(file)))
    }

    /*
     * Selects the destination described by the run configuration: the log file
     * when one was given, standard output otherwise.
     */
    pub fn for_config(config: &RunConfig) -> config::Result<Self> {
        match config.log_file() {
            Some(path) => Self::open_log_file(path),
            None => Ok(Self::stdout()),
        }
    }

    /*
     * Writes `line` followed by a newline while holding the lock, then flushes.
     */
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        if !line.ends_with('\n') {
            bytes.push(b'\n');
        }
        self.write_all_locked(&bytes)
    }

    fn write_all_locked(&self, bytes: &[u8]) -> io::Result<()> {
        // A writer poisoned by a panicking worker is still usable for whole lines.
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(bytes)?;
        writer.flush()
    }

    pub fn flush(&self) -> io::Result<()> {
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

/*
 * `Write` adapter over a shared `OutputSink`. Bytes are accumulated until a
 * newline arrives and each completed line is handed to the sink in a single
 * locked write. Any trailing partial line is written on `flush`.
 */
pub struct SinkLineWriter {
    sink: Arc<OutputSink>,
    pending: Vec<u8>,
}

impl SinkLineWriter {
    pub fn new(sink: Arc<OutputSink>) -> Self {
        SinkLineWriter {
            sink,
            pending: Vec::new(),
        }
    }
}

impl Write for SinkLineWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while let Some(newline) = self.pending.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            self.sink.write_all_locked(&line)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.sink.write_all_locked(&rest)?;
        }
        self.sink.flush()
    }
}

impl Drop for SinkLineWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/*
 * In-memory writer for tests. Clones share the same buffer, so a test can keep
 * one handle and give the other to an `OutputSink`.
 */
#[cfg(test)]
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

#[cfg(test)]
impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use std::thread;
    use tempfile::tempdir;

    fn buffered_sink() -> (Arc<OutputSink>, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let sink = Arc::new(OutputSink::from_writer(Box::new(buffer.clone())));
        (sink, buffer)
    }

    #[test]
    fn test_write_line_appends_single_newline() {
        let (sink, buffer) = buffered_sink();
        sink.write_line("first").unwrap();
        sink.write_line("second\n").unwrap();
        assert_eq!(buffer.contents(), "first\nsecond\n");
    }

    #[test]
    fn test_line_writer_holds_partial_lines_until_newline() {
        let (sink, buffer) = buffered_sink();
        let mut writer = SinkLineWriter::new(Arc::clone(&sink));

        write!(writer, "12:00:00 [INFO] ").unwrap();
        assert_eq!(buffer.contents(), "");
        writeln!(writer, "hello").unwrap();
        assert_eq!(buffer.contents(), "12:00:00 [INFO] hello\n");

        write!(writer, "tail").unwrap();
        writer.flush().unwrap();
        assert_eq!(buffer.contents(), "12:00:00 [INFO] hello\ntail");
    }

    #[test]
    fn test_concurrent_writers_never_tear_lines() {
        let (sink, buffer) = buffered_sink();
        let threads = 8;
        let lines_per_thread = 200;

        let handles: Vec<_> = (0..threads)
            .map(|thread_index| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    let mut log_writer = SinkLineWriter::new(Arc::clone(&sink));
                    for line_index in 0..lines_per_thread {
                        if line_index % 2 == 0 {
                            sink.write_line(&format!("File: t{thread_index}-l{line_index} (1 tks)"))
                                .unwrap();
                        } else {
                            // Fragmented like a logger writing a record in pieces.
                            write!(log_writer, "record ").unwrap();
                            write!(log_writer, "t{thread_index}-l{line_index}").unwrap();
                            writeln!(log_writer, " done").unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = buffer.lines();
        assert_eq!(lines.len(), threads * lines_per_thread);
        let mut seen = HashSet::new();
        for line in &lines {
            let well_formed = (line.starts_with("File: t") && line.ends_with(" (1 tks)"))
                || (line.starts_with("record t") && line.ends_with(" done"));
            assert!(well_formed, "Torn line in output: {line:?}");
            assert!(seen.insert(line.clone()), "Duplicated line: {line:?}");
        }
    }

    #[test]
    fn test_open_log_file_creates_and_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log");
        fs::write(&path, "existing\n").unwrap();

        let sink = OutputSink::open_log_file(&path).unwrap();
        sink.write_line("appended").unwrap();
        drop(sink);
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\nappended\n");

        let fresh_path = dir.path().join("fresh.log");
        let sink = OutputSink::open_log_file(&fresh_path).unwrap();
        sink.write_line("created").unwrap();
        assert_eq!(fs::read_to_string(&fresh_path).unwrap(), "created\n");
    }

    #[test]
    fn test_open_log_file_in_missing_directory_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("run.log");
        match OutputSink::open_log_file(&path) {
            Err(ConfigError::LogFile { path: reported, .. }) => assert_eq!(reported, path),
            Ok(_) => panic!("Opening a log file in a missing directory should fail"),
        }
    }

    #[test]
    fn test_for_config_uses_log_file_when_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("configured.log");
        let config = RunConfig::new(false, path.to_str().unwrap(), 1, false);

        let sink = OutputSink::for_config(&config).unwrap();
        sink.write_line("via config").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "via config\n");
    }
}
