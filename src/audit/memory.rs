//! Volatile in-memory audit logger.

use super::{EventLogger, LogEntry};
use crate::Result;
use std::sync::Mutex;

/// Stores audit entries in memory.
///
/// Everything is lost when the logger is dropped; useful for tests and for
/// deployments that only need a recent window of entries.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    /// Creates a new empty in-memory logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded entries, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if a previous holder of the entry lock panicked.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    /// Returns the number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no entries have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventLogger for MemoryLogger {
    fn append(&self, entry: LogEntry) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(entry);
        Ok(())
    }
}
