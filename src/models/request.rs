//! Request context and duplicate-check outcomes.

use crate::models::Attribute;
use serde::Serialize;

/// Transport-supplied context for one incoming request.
///
/// The HTTP layer is an external collaborator; it hands the core enough
/// information for audit entries without this crate depending on any request
/// type of its own.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// The caller's network origin, if known.
    pub remote_addr: Option<String>,
    /// The raw request payload as received.
    pub payload: String,
}

impl RequestContext {
    /// Creates a context with a remote address and raw payload.
    pub fn new(remote_addr: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            remote_addr: Some(remote_addr.into()),
            payload: payload.into(),
        }
    }
}

/// The partition of a checked attribute set into unique and duplicate items.
///
/// Duplicate decisions are made against the whole set's fingerprint, so one
/// side always holds the full set and the other is empty. The two sides are
/// disjoint by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckOutcome {
    /// Attributes not seen before this request.
    pub unique: Vec<Attribute>,
    /// Attributes already recorded by an earlier request.
    pub duplicate: Vec<Attribute>,
}

impl CheckOutcome {
    /// Builds the outcome for a set recorded for the first time.
    #[must_use]
    pub fn all_unique(attributes: Vec<Attribute>) -> Self {
        Self {
            unique: attributes,
            duplicate: Vec::new(),
        }
    }

    /// Builds the outcome for a set that was already recorded.
    #[must_use]
    pub fn all_duplicate(attributes: Vec<Attribute>) -> Self {
        Self {
            unique: Vec::new(),
            duplicate: attributes,
        }
    }

    /// Returns `true` if this request was the first to record its set.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.duplicate.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_partition_is_disjoint() {
        let attrs = vec![Attribute::new("phone", "555-1111")];

        let fresh = CheckOutcome::all_unique(attrs.clone());
        assert!(fresh.is_unique());
        assert_eq!(fresh.unique, attrs);
        assert!(fresh.duplicate.is_empty());

        let seen = CheckOutcome::all_duplicate(attrs.clone());
        assert!(!seen.is_unique());
        assert_eq!(seen.duplicate, attrs);
        assert!(seen.unique.is_empty());
    }
}
