//! Audit trail of request outcomes.
//!
//! Every completed or failed duplicate-check request produces a structured
//! [`LogEntry`] that an [`EventLogger`] hands to a backend-specific
//! persistence step. Loggers never influence the dedup decision: the service
//! fans entries out best-effort and a failing logger is demoted to a warning,
//! never raised back into the request path.
//!
//! Reference implementations:
//!
//! - [`NullLogger`] — throws entries away without assembling them
//! - [`MemoryLogger`] — volatile in-memory buffer
//! - [`FileLogger`] — line-delimited JSON to a file, with a
//!   [`FileLogger::stdout`] specialization bound to standard output
//!
//! Both store backends also implement [`EventLogger`], which is what lets a
//! `"store:"` logger descriptor alias the already-resolved store.

mod file;
mod memory;
mod null;

pub use file::FileLogger;
pub use memory::MemoryLogger;
pub use null::NullLogger;

use crate::models::{CheckOutcome, RequestContext};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One structured audit entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// When the entry was assembled.
    pub timestamp: DateTime<Utc>,
    /// The caller's network origin, if the transport knew it.
    pub remote_addr: Option<String>,
    /// The raw request payload as received.
    pub req_body: String,
    /// Whether the request succeeded.
    pub success: bool,
    /// The response payload sent to the caller, for successful requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<CheckOutcome>,
    /// The error message surfaced to the caller, for failed requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl LogEntry {
    /// Assembles the entry for a completed request.
    #[must_use]
    pub fn success(ctx: &RequestContext, outcome: &CheckOutcome) -> Self {
        Self {
            timestamp: Utc::now(),
            remote_addr: ctx.remote_addr.clone(),
            req_body: ctx.payload.clone(),
            success: true,
            response: Some(outcome.clone()),
            error_msg: None,
        }
    }

    /// Assembles the entry for a failed request.
    #[must_use]
    pub fn error(ctx: &RequestContext, message: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            remote_addr: ctx.remote_addr.clone(),
            req_body: ctx.payload.clone(),
            success: false,
            response: None,
            error_msg: Some(message.to_string()),
        }
    }
}

/// Capability contract for audit backends.
///
/// `record_success` and `record_error` assemble the structured entry and hand
/// it to [`EventLogger::append`], the backend-specific persistence step.
/// Implementations that skip entry assembly entirely (the null logger) may
/// override the provided methods instead.
pub trait EventLogger: Send + Sync {
    /// Persists one assembled entry.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::LogFailed`] if the backend could not persist
    /// the entry. Callers on the request path treat this as best-effort.
    fn append(&self, entry: LogEntry) -> Result<()>;

    /// Records a completed request, its response, and the unique/duplicate
    /// partition of the request's attribute set.
    ///
    /// # Errors
    ///
    /// Propagates [`EventLogger::append`] failures.
    fn record_success(&self, ctx: &RequestContext, outcome: &CheckOutcome) -> Result<()> {
        self.append(LogEntry::success(ctx, outcome))
    }

    /// Records a failed request and the error surfaced to the caller.
    ///
    /// # Errors
    ///
    /// Propagates [`EventLogger::append`] failures.
    fn record_error(&self, ctx: &RequestContext, message: &str) -> Result<()> {
        self.append(LogEntry::error(ctx, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Attribute;

    #[test]
    fn test_success_entry_fields() {
        let ctx = RequestContext::new("203.0.113.7", r#"{"key":"k"}"#);
        let outcome = CheckOutcome::all_unique(vec![Attribute::new("phone", "555-1111")]);

        let entry = LogEntry::success(&ctx, &outcome);
        assert!(entry.success);
        assert_eq!(entry.remote_addr.as_deref(), Some("203.0.113.7"));
        assert_eq!(entry.req_body, r#"{"key":"k"}"#);
        assert!(entry.response.is_some());
        assert!(entry.error_msg.is_none());
    }

    #[test]
    fn test_error_entry_serializes_without_response() {
        let ctx = RequestContext::default();
        let entry = LogEntry::error(&ctx, "unauthorized");

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_msg"], "unauthorized");
        assert!(json.get("response").is_none());
    }
}
