//! Component registry: scheme → constructor or reference marker.
//!
//! A [`Registry`] is an explicit value built at startup and threaded through
//! configuration resolution; there is no process-global scheme table. Each
//! entry either constructs a component from a parsed [`Descriptor`] or marks
//! the scheme as an alias for another already-resolved configuration field.

use crate::config::Descriptor;
use crate::{Error, Result};
use std::collections::HashMap;

/// Errors a constructor may surface; wrapped uniformly by [`Registry::resolve`].
pub type ConstructorError = Box<dyn std::error::Error + Send + Sync>;

/// A component constructor taking the parsed descriptor.
pub type Constructor<T> =
    Box<dyn Fn(&Descriptor) -> std::result::Result<T, ConstructorError> + Send + Sync>;

/// One registry entry.
pub enum Registration<T> {
    /// Construct a fresh component from the descriptor.
    Construct(Constructor<T>),
    /// Reuse whatever was resolved for the named configuration field.
    Reference(String),
}

/// Outcome of resolving a descriptor against a registry.
#[derive(Debug)]
pub enum Resolution<T> {
    /// A freshly constructed component. Any external resource the
    /// constructor opened is owned by the component.
    Component(T),
    /// The descriptor aliases the named, already-resolved field.
    Reference(String),
}

/// Maps scheme identifiers to component constructors or reference markers.
///
/// The entry registered under [`Registry::register_default`] is used when a
/// descriptor is empty or absent.
pub struct Registry<T> {
    entries: HashMap<Option<String>, Registration<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Registry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers a constructor for a scheme.
    pub fn register(
        &mut self,
        scheme: impl Into<String>,
        constructor: impl Fn(&Descriptor) -> std::result::Result<T, ConstructorError>
            + Send
            + Sync
            + 'static,
    ) {
        self.entries.insert(
            Some(scheme.into()),
            Registration::Construct(Box::new(constructor)),
        );
    }

    /// Registers the constructor used for empty or absent descriptors.
    pub fn register_default(
        &mut self,
        constructor: impl Fn(&Descriptor) -> std::result::Result<T, ConstructorError>
            + Send
            + Sync
            + 'static,
    ) {
        self.entries
            .insert(None, Registration::Construct(Box::new(constructor)));
    }

    /// Registers a scheme as an alias for another resolved field.
    pub fn register_reference(&mut self, scheme: impl Into<String>, field: impl Into<String>) {
        self.entries
            .insert(Some(scheme.into()), Registration::Reference(field.into()));
    }

    /// Resolves a descriptor string into a component or reference marker.
    ///
    /// An empty or absent descriptor selects the default entry. Constructor
    /// failures are re-signaled uniformly as [`Error::ComponentInit`]
    /// carrying the original descriptor, never a backend-specific error type.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownScheme`] if no entry matches; nothing is constructed.
    /// - [`Error::ComponentInit`] if the matched constructor failed.
    pub fn resolve(&self, descriptor: Option<&str>) -> Result<Resolution<T>> {
        let descriptor = descriptor.filter(|d| !d.is_empty());
        let (key, parsed) = match descriptor {
            Some(raw) => {
                let parsed = Descriptor::parse(raw);
                (Some(parsed.scheme().to_string()), parsed)
            }
            None => (None, Descriptor::parse("")),
        };

        let entry = self
            .entries
            .get(&key)
            .ok_or_else(|| Error::UnknownScheme {
                scheme: key.clone().unwrap_or_default(),
            })?;

        match entry {
            Registration::Construct(constructor) => {
                let component = constructor(&parsed).map_err(|cause| Error::ComponentInit {
                    descriptor: parsed.raw().to_string(),
                    cause: cause.to_string(),
                })?;
                tracing::debug!(descriptor = %parsed, "constructed component");
                Ok(Resolution::Component(component))
            }
            Registration::Reference(field) => Ok(Resolution::Reference(field.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry<String> {
        let mut registry = Registry::new();
        registry.register_default(|_| Ok("default".to_string()));
        registry.register("echo", |d: &Descriptor| Ok(d.path().to_string()));
        registry.register("fail", |_| Err("constructor exploded".into()));
        registry.register_reference("store", "store");
        registry
    }

    #[test]
    fn test_absent_descriptor_uses_default_entry() {
        let registry = registry();
        for descriptor in [None, Some("")] {
            match registry.resolve(descriptor).unwrap() {
                Resolution::Component(v) => assert_eq!(v, "default"),
                Resolution::Reference(_) => panic!("expected component"),
            }
        }
    }

    #[test]
    fn test_constructor_receives_parsed_descriptor() {
        match registry().resolve(Some("echo:///a/b")).unwrap() {
            Resolution::Component(v) => assert_eq!(v, "/a/b"),
            Resolution::Reference(_) => panic!("expected component"),
        }
    }

    #[test]
    fn test_unknown_scheme_constructs_nothing() {
        let err = registry().resolve(Some("bogus:")).unwrap_err();
        match err {
            Error::UnknownScheme { scheme } => assert_eq!(scheme, "bogus"),
            other => panic!("expected UnknownScheme, got {other}"),
        }
    }

    #[test]
    fn test_constructor_failure_wrapped_uniformly() {
        let err = registry().resolve(Some("fail:whatever")).unwrap_err();
        match err {
            Error::ComponentInit { descriptor, cause } => {
                assert_eq!(descriptor, "fail:whatever");
                assert!(cause.contains("constructor exploded"));
            }
            other => panic!("expected ComponentInit, got {other}"),
        }
    }

    #[test]
    fn test_reference_marker_passes_through() {
        match registry().resolve(Some("store:")).unwrap() {
            Resolution::Reference(field) => assert_eq!(field, "store"),
            Resolution::Component(_) => panic!("expected reference"),
        }
    }
}
