//! No-op audit logger.

use super::{EventLogger, LogEntry};
use crate::models::{CheckOutcome, RequestContext};
use crate::Result;

/// Stub logger. Throws entries away without assembling them.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl NullLogger {
    /// Creates a new null logger.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EventLogger for NullLogger {
    fn append(&self, _entry: LogEntry) -> Result<()> {
        Ok(())
    }

    // Skip entry assembly entirely.
    fn record_success(&self, _ctx: &RequestContext, _outcome: &CheckOutcome) -> Result<()> {
        Ok(())
    }

    fn record_error(&self, _ctx: &RequestContext, _message: &str) -> Result<()> {
        Ok(())
    }
}
