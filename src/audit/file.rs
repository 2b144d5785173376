//! File-writing audit logger.

use super::{EventLogger, LogEntry};
use crate::{Error, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Appends entries to a writable stream as line-delimited JSON.
///
/// [`FileLogger::open`] binds the logger to a file opened in append mode;
/// [`FileLogger::stdout`] is the same logger bound to the process's standard
/// output stream.
pub struct FileLogger {
    out: Mutex<Box<dyn Write + Send>>,
}

impl FileLogger {
    /// Opens a file at `path` in append mode and logs entries to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LogFailed`] if the file cannot be opened or created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::LogFailed(format!("open '{}': {e}", path.display())))?;
        Ok(Self {
            out: Mutex::new(Box::new(file)),
        })
    }

    /// Creates a logger bound to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            out: Mutex::new(Box::new(std::io::stdout())),
        }
    }

}

impl std::fmt::Debug for FileLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLogger").finish_non_exhaustive()
    }
}

impl EventLogger for FileLogger {
    fn append(&self, entry: LogEntry) -> Result<()> {
        let line = serde_json::to_string(&entry)
            .map_err(|e| Error::LogFailed(format!("serialize entry: {e}")))?;
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        writeln!(out, "{line}").map_err(|e| Error::LogFailed(format!("write entry: {e}")))?;
        out.flush()
            .map_err(|e| Error::LogFailed(format!("flush entry: {e}")))
    }
}
