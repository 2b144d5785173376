//! Scheme-descriptor parsing.
//!
//! Pluggable backends are selected by URL-style descriptor strings such as
//! `tmp:`, `sqlite:///var/lib/sicds/dedup.db`, or `file:///var/log/sicds.log`.
//! The scheme picks the component out of a [`Registry`](crate::Registry); the
//! remainder carries backend-specific parameters.

use std::fmt;

/// A parsed scheme descriptor.
///
/// Splitting never fails: a string without a `:` separator parses to an empty
/// scheme, which no registry registers, so resolution reports it as an
/// unknown scheme rather than a parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    raw: String,
    scheme: String,
    rest: String,
}

impl Descriptor {
    /// Parses a descriptor string into scheme and parameter remainder.
    ///
    /// # Examples
    ///
    /// ```
    /// use sicds::Descriptor;
    ///
    /// let d = Descriptor::parse("sqlite:///var/lib/sicds/dedup.db");
    /// assert_eq!(d.scheme(), "sqlite");
    /// assert_eq!(d.path(), "/var/lib/sicds/dedup.db");
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let (scheme, rest) = raw.split_once(':').unwrap_or(("", raw));
        Self {
            raw: raw.to_string(),
            scheme: scheme.to_string(),
            rest: rest.to_string(),
        }
    }

    /// The original descriptor string, for diagnostics.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The scheme naming the backend kind. Empty if the descriptor had no
    /// `:` separator.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Everything after the scheme separator, uninterpreted.
    #[must_use]
    pub fn rest(&self) -> &str {
        &self.rest
    }

    /// The descriptor's path component, with any `//` authority prefix
    /// stripped. `file:///a/b` and `file:/a/b` both yield `/a/b`.
    #[must_use]
    pub fn path(&self) -> &str {
        self.rest.strip_prefix("//").unwrap_or(&self.rest)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_scheme() {
        let d = Descriptor::parse("tmp:");
        assert_eq!(d.scheme(), "tmp");
        assert_eq!(d.rest(), "");
        assert_eq!(d.path(), "");
    }

    #[test]
    fn test_triple_slash_path() {
        let d = Descriptor::parse("file:///var/log/sicds.log");
        assert_eq!(d.scheme(), "file");
        assert_eq!(d.path(), "/var/log/sicds.log");
    }

    #[test]
    fn test_relative_path() {
        let d = Descriptor::parse("sqlite:dedup.db");
        assert_eq!(d.path(), "dedup.db");
    }

    #[test]
    fn test_missing_separator_yields_empty_scheme() {
        let d = Descriptor::parse("bogus");
        assert_eq!(d.scheme(), "");
        assert_eq!(d.rest(), "bogus");
    }
}
