//! Identifying attributes and their canonical fingerprint form.
//!
//! An [`Attribute`] is one identifying fact extracted from a report, such as a
//! phone number under kind `"phone"`. An [`AttributeSet`] is the full ordered
//! collection of attributes identifying one report. Only the canonical
//! [`Fingerprint`] of a set is ever persisted; the set itself lives for the
//! duration of a single request.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// One identifying (kind, value) fact extracted from a report.
///
/// Attributes are immutable and compare structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    /// The kind of identifying fact, e.g. `"phone"` or `"email"`.
    pub kind: String,
    /// The value of the fact, e.g. `"555-1111"`.
    pub value: String,
}

impl Attribute {
    /// Creates a new attribute.
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind, self.value)
    }
}

/// The full ordered collection of attributes identifying one report.
///
/// Constructed per incoming request and never persisted directly; the store
/// records only the canonical [`Fingerprint`]. Input order is preserved, so
/// two sets holding the same attributes in different order have different
/// fingerprints (see [`AttributeSet::fingerprint`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(Vec<Attribute>);

impl AttributeSet {
    /// Creates an attribute set from a list of attributes.
    #[must_use]
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self(attributes)
    }

    /// Creates an attribute set from (kind, value) string pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// use sicds::AttributeSet;
    ///
    /// let attrs = AttributeSet::from_pairs([("phone", "555-1111"), ("email", "a@b.com")]);
    /// assert_eq!(attrs.len(), 2);
    /// ```
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| Attribute::new(k, v))
                .collect(),
        )
    }

    /// Returns the attributes in input order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.0
    }

    /// Returns the number of attributes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set holds no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Computes the canonical fingerprint of this set.
    ///
    /// Canonicalization preserves input order rather than sorting, matching
    /// the behavior duplicate decisions have always been made against:
    /// equivalent sets submitted in different orders are treated as distinct.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint(
            self.0
                .iter()
                .map(|a| (a.kind.clone(), a.value.clone()))
                .collect(),
        )
    }
}

impl From<Vec<Attribute>> for AttributeSet {
    fn from(attributes: Vec<Attribute>) -> Self {
        Self(attributes)
    }
}

impl<'a> IntoIterator for &'a AttributeSet {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The canonical comparison key of an [`AttributeSet`].
///
/// An ordered sequence of (kind, value) pairs. This is the only form of a
/// report's identity that stores persist or compare.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(Vec<(String, String)>);

impl Fingerprint {
    /// Returns the canonical (kind, value) pairs.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    /// Returns a stable SHA256 hex digest of the fingerprint.
    ///
    /// Durable backends use this as their key column; the in-memory store
    /// keys on the fingerprint itself. Kind and value are length-prefixed
    /// before hashing so pair boundaries cannot collide.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for (kind, value) in &self.0 {
            hasher.update((kind.len() as u64).to_be_bytes());
            hasher.update(kind.as_bytes());
            hasher.update((value.len() as u64).to_be_bytes());
            hasher.update(value.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_equality_is_structural() {
        let a = Attribute::new("phone", "555-1111");
        let b = Attribute::new("phone", "555-1111");
        assert_eq!(a, b);
        assert_ne!(a, Attribute::new("phone", "555-2222"));
        assert_ne!(a, Attribute::new("fax", "555-1111"));
    }

    #[test]
    fn test_fingerprint_preserves_input_order() {
        let forward = AttributeSet::from_pairs([("phone", "555-1111"), ("email", "a@b.com")]);
        let reversed = AttributeSet::from_pairs([("email", "a@b.com"), ("phone", "555-1111")]);

        assert_ne!(forward.fingerprint(), reversed.fingerprint());
        assert_ne!(forward.fingerprint().digest(), reversed.fingerprint().digest());
    }

    #[test]
    fn test_fingerprint_digest_is_stable() {
        let attrs = AttributeSet::from_pairs([("phone", "555-1111")]);
        assert_eq!(attrs.fingerprint().digest(), attrs.fingerprint().digest());
    }

    #[test]
    fn test_digest_respects_pair_boundaries() {
        // "ab"+"c" must not collide with "a"+"bc"
        let left = AttributeSet::from_pairs([("ab", "c")]);
        let right = AttributeSet::from_pairs([("a", "bc")]);
        assert_ne!(left.fingerprint().digest(), right.fingerprint().digest());
    }

    #[test]
    fn test_attribute_set_serde_round_trip() {
        let attrs = AttributeSet::from_pairs([("phone", "555-1111"), ("email", "a@b.com")]);
        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(
            json,
            r#"[{"kind":"phone","value":"555-1111"},{"kind":"email","value":"a@b.com"}]"#
        );
        let back: AttributeSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attrs);
    }
}
