//! Duplicate-store layer abstraction.
//!
//! This module provides the [`DuplicateStore`] contract — the capability
//! `{contains, add, clear}` plus the atomic [`DuplicateStore::check_and_add`]
//! every backend must implement — and two reference backends:
//!
//! - **`MemoryStore`**: volatile, a mutex-held hash set of fingerprints
//! - **`SqliteStore`**: durable, keyed on fingerprint digests in `SQLite`
//!
//! One store instance is created per service lifetime and shared by all
//! request handlers; it owns all dedup state. Both backends also implement
//! the audit [`EventLogger`](crate::audit::EventLogger) contract so a
//! `"store:"` logger descriptor can alias the store instance.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::audit::EventLogger;
use crate::models::AttributeSet;
use crate::Result;
use std::sync::Arc;

/// Capability contract for duplicate-store backends.
///
/// Backends take `&self` and manage their own interior mutability; the one
/// instance behind this trait is shared by all concurrent request handlers.
pub trait DuplicateStore: Send + Sync {
    /// Returns `true` iff the canonical form of `attrs` was previously
    /// recorded and never cleared.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreFailed`] if the backend cannot answer.
    fn contains(&self, attrs: &AttributeSet) -> Result<bool>;

    /// Records the canonical form of `attrs` as seen.
    ///
    /// Idempotent and all-or-nothing: adding the same set twice leaves the
    /// store in the same observable state as adding it once, and a set is
    /// never left half-recorded.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreFailed`] if the backend cannot record.
    fn add(&self, attrs: &AttributeSet) -> Result<()>;

    /// Atomically records `attrs` if not already present.
    ///
    /// Returns `true` iff this call was the one that recorded the set. Two
    /// concurrent calls for the same content observe exactly one `true`
    /// between them; the naive contains-then-add sequence cannot make that
    /// guarantee and must not be used on the request path.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreFailed`] if the backend cannot decide.
    fn check_and_add(&self, attrs: &AttributeSet) -> Result<bool>;

    /// Removes all recorded state.
    ///
    /// Administrative and low-frequency; may briefly block concurrent calls
    /// but never exposes a partial clear.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StoreFailed`] if the backend cannot clear.
    fn clear(&self) -> Result<()>;
}

/// A constructed store backend together with its optional audit view.
///
/// Store constructors build one concrete instance and expose it under both
/// capability contracts when the backend supports logging. The audit view
/// shares the allocation with the store view, which is what makes the
/// `"store"` logger alias identity-equal to the store.
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<dyn DuplicateStore>,
    logger: Option<Arc<dyn EventLogger>>,
}

impl StoreHandle {
    /// Wraps a backend that implements both contracts.
    pub fn with_logger<T>(backend: Arc<T>) -> Self
    where
        T: DuplicateStore + EventLogger + 'static,
    {
        Self {
            store: backend.clone(),
            logger: Some(backend),
        }
    }

    /// Wraps a backend that only implements the store contract.
    pub fn store_only<T>(backend: Arc<T>) -> Self
    where
        T: DuplicateStore + 'static,
    {
        Self {
            store: backend,
            logger: None,
        }
    }

    /// Returns the shared store instance.
    #[must_use]
    pub fn store(&self) -> Arc<dyn DuplicateStore> {
        self.store.clone()
    }

    /// Returns the store's audit view, if the backend supports logging.
    #[must_use]
    pub fn logger(&self) -> Option<Arc<dyn EventLogger>> {
        self.logger.clone()
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("has_logger", &self.logger.is_some())
            .finish()
    }
}
