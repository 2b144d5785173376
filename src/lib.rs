//! # sicds
//!
//! Core decision logic for a duplicate-identification service.
//!
//! Given the set of identifying attributes extracted from an incoming report,
//! sicds decides whether that identity has been seen before and, if not,
//! atomically records it as seen. Transport, attribute extraction, and process
//! startup are external collaborators; this crate owns:
//!
//! - The [`DuplicateStore`] contract and its in-memory and `SQLite` backends
//! - The [`EventLogger`] audit contract and its reference implementations
//! - Declarative configuration resolution: a schema of required/optional
//!   fields, scheme-descriptor registries for pluggable backends, and
//!   reference markers that let one resolved field alias another
//! - The per-request check-and-record path in [`DedupService`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use sicds::{AttributeSet, DedupService, RawConfig, RequestContext, ServiceConfig};
//!
//! let raw: RawConfig = serde_json::from_str(r#"{"superkey": "S", "store": "tmp:"}"#)?;
//! let service = DedupService::new(ServiceConfig::resolve(&raw)?);
//!
//! let attrs = AttributeSet::from_pairs([("phone", "555-1111"), ("email", "a@b.com")]);
//! let outcome = service.check(&ctx, "sicds_default_key", &attrs)?;
//! assert!(outcome.is_unique());
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod audit;
pub mod config;
pub mod models;
pub mod observability;
pub mod service;
pub mod storage;

// Re-exports for convenience
pub use audit::{EventLogger, FileLogger, LogEntry, MemoryLogger, NullLogger};
pub use config::{
    Descriptor, FieldValue, RawConfig, Registration, Registry, Resolution, Schema, ServiceConfig,
};
pub use models::{Attribute, AttributeSet, CheckOutcome, Fingerprint, RequestContext};
pub use service::DedupService;
pub use storage::{DuplicateStore, MemoryStore, SqliteStore, StoreHandle};

/// Error type for sicds operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When | Fatality |
/// |---------|-------------|----------|
/// | `UnknownScheme` | Descriptor names a scheme with no registered component | startup-fatal |
/// | `ComponentInit` | A registered constructor failed (bad path, unreachable backend) | startup-fatal |
/// | `MissingField` | A required configuration field is absent | startup-fatal |
/// | `ConfigField` | A field's resolver rejected its input | startup-fatal |
/// | `Unauthorized` | Access key or superkey does not match configured values | request-fatal |
/// | `StoreFailed` | A store backend operation failed at request time | request-fatal |
/// | `LogFailed` | An audit logger could not persist an entry | never propagated |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A configuration descriptor named a scheme with no registered component.
    #[error("unknown scheme '{scheme}'")]
    UnknownScheme {
        /// The offending scheme string.
        scheme: String,
    },

    /// A registered component's constructor failed.
    ///
    /// Wraps the underlying cause uniformly so configuration failures are
    /// reported in one shape regardless of backend.
    #[error("failed to initialize component from '{descriptor}': {cause}")]
    ComponentInit {
        /// The original descriptor being resolved.
        descriptor: String,
        /// The underlying cause.
        cause: String,
    },

    /// A required configuration field is absent from the input.
    #[error("missing required configuration field '{field}'")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// A configuration field's resolver rejected its value.
    #[error("invalid configuration field '{field}': {cause}")]
    ConfigField {
        /// The name of the offending field.
        field: String,
        /// The underlying cause.
        cause: String,
    },

    /// Access key or superkey does not match the configured values.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A duplicate-store backend operation failed.
    ///
    /// The dedup decision cannot be made, so the request must fail rather
    /// than silently guess.
    #[error("store operation '{operation}' failed: {cause}")]
    StoreFailed {
        /// The store operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// An audit logger could not persist an entry.
    ///
    /// Logging is best-effort relative to the dedup decision; callers on the
    /// request path demote this to a warning instead of propagating it.
    #[error("audit log write failed: {0}")]
    LogFailed(String),
}

/// Result type alias for sicds operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownScheme {
            scheme: "bogus".to_string(),
        };
        assert_eq!(err.to_string(), "unknown scheme 'bogus'");

        let err = Error::ComponentInit {
            descriptor: "sqlite:///bad/path".to_string(),
            cause: "unable to open database file".to_string(),
        };
        assert!(err.to_string().contains("sqlite:///bad/path"));
        assert!(err.to_string().contains("unable to open database file"));

        let err = Error::MissingField {
            field: "superkey".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "missing required configuration field 'superkey'"
        );

        let err = Error::StoreFailed {
            operation: "check_and_add".to_string(),
            cause: "disk I/O error".to_string(),
        };
        assert!(err.to_string().contains("check_and_add"));
    }
}
