//! In-memory duplicate store.

use crate::audit::{EventLogger, LogEntry};
use crate::models::{AttributeSet, Fingerprint};
use crate::storage::DuplicateStore;
use crate::Result;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Stores fingerprints in memory.
///
/// Everything is lost when the store is dropped; this is the default backend
/// and the one behind the `tmp:` scheme. A single mutex guards the set, so
/// [`DuplicateStore::check_and_add`] is one critical section and two
/// concurrent submissions of identical content cannot both be told "unique".
///
/// Also buffers audit entries, so the `"store"` logger alias works against
/// this backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    seen: Mutex<HashSet<Fingerprint>>,
    audit: Mutex<Vec<LogEntry>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of recorded fingerprints.
    #[must_use]
    pub fn count(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns a snapshot of buffered audit entries, oldest first.
    #[must_use]
    pub fn audit_entries(&self) -> Vec<LogEntry> {
        self.audit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DuplicateStore for MemoryStore {
    fn contains(&self, attrs: &AttributeSet) -> Result<bool> {
        Ok(self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&attrs.fingerprint()))
    }

    fn add(&self, attrs: &AttributeSet) -> Result<()> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(attrs.fingerprint());
        Ok(())
    }

    fn check_and_add(&self, attrs: &AttributeSet) -> Result<bool> {
        // Single lock section covers both the membership test and the insert.
        let newly_recorded = self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(attrs.fingerprint());
        Ok(newly_recorded)
    }

    fn clear(&self) -> Result<()> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

impl EventLogger for MemoryStore {
    fn append(&self, entry: LogEntry) -> Result<()> {
        self.audit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AttributeSet {
        AttributeSet::from_pairs([("phone", "555-1111"), ("email", "a@b.com")])
    }

    #[test]
    fn test_contains_false_until_added() {
        let store = MemoryStore::new();
        assert!(!store.contains(&sample()).unwrap());
        store.add(&sample()).unwrap();
        assert!(store.contains(&sample()).unwrap());
    }

    #[test]
    fn test_add_is_idempotent() {
        let store = MemoryStore::new();
        store.add(&sample()).unwrap();
        store.add(&sample()).unwrap();
        assert_eq!(store.count(), 1);
        assert!(store.contains(&sample()).unwrap());
    }

    #[test]
    fn test_check_and_add_reports_first_insert_only() {
        let store = MemoryStore::new();
        assert!(store.check_and_add(&sample()).unwrap());
        assert!(!store.check_and_add(&sample()).unwrap());
    }

    #[test]
    fn test_clear_resets_everything() {
        let store = MemoryStore::new();
        let other = AttributeSet::from_pairs([("twitter", "@foo")]);
        store.add(&sample()).unwrap();
        store.add(&other).unwrap();

        store.clear().unwrap();
        assert!(!store.contains(&sample()).unwrap());
        assert!(!store.contains(&other).unwrap());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_order_sensitive_membership() {
        let store = MemoryStore::new();
        store
            .add(&AttributeSet::from_pairs([
                ("phone", "555-1111"),
                ("email", "a@b.com"),
            ]))
            .unwrap();
        let reversed = AttributeSet::from_pairs([("email", "a@b.com"), ("phone", "555-1111")]);
        assert!(!store.contains(&reversed).unwrap());
    }

    #[test]
    fn test_concurrent_check_and_add_yields_one_unique() {
        use std::sync::Arc;

        let store = Arc::new(MemoryStore::new());
        let attrs = sample();
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let attrs = attrs.clone();
            handles.push(std::thread::spawn(move || {
                store.check_and_add(&attrs).unwrap()
            }));
        }

        let uniques = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|newly| *newly)
            .count();
        assert_eq!(uniques, 1);
    }
}
