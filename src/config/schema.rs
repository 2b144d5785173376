//! Declarative configuration schema.
//!
//! A [`Schema`] is an ordered list of [`FieldSpec`]s, each naming a field,
//! its required/optional classification, a resolver coercing the raw value
//! into a typed [`FieldValue`], and for optional fields a lazily-evaluated
//! default. [`Schema::resolve`] walks the fields in declared order, so a
//! later field's resolver can read what an earlier field resolved to — the
//! forward-reference mechanism that lets a logger alias the store.

use crate::audit::EventLogger;
use crate::storage::StoreHandle;
use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A typed, resolved configuration value.
#[derive(Clone)]
pub enum FieldValue {
    /// A plain string field (superkey, host).
    Text(String),
    /// A network port.
    Port(u16),
    /// A list of access keys.
    Keys(Vec<String>),
    /// A resolved duplicate-store backend.
    Store(StoreHandle),
    /// A resolved list of audit loggers.
    Loggers(Vec<Arc<dyn EventLogger>>),
    /// Alias the value already bound to the named field.
    Reference(String),
}

impl std::fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Port(p) => f.debug_tuple("Port").field(p).finish(),
            Self::Keys(k) => f.debug_tuple("Keys").field(k).finish(),
            Self::Store(_) => f.write_str("Store(..)"),
            Self::Loggers(l) => write!(f, "Loggers(len={})", l.len()),
            Self::Reference(t) => f.debug_tuple("Reference").field(t).finish(),
        }
    }
}

impl FieldValue {
    fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Port(_) => "port",
            Self::Keys(_) => "keys",
            Self::Store(_) => "store",
            Self::Loggers(_) => "loggers",
            Self::Reference(_) => "reference",
        }
    }

    fn mismatch(&self, field: &str, expected: &str) -> Error {
        Error::ConfigField {
            field: field.to_string(),
            cause: format!("resolved to {} where {expected} was expected", self.kind()),
        }
    }

    /// Extracts a text value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigField`] naming `field` on a kind mismatch.
    pub fn into_text(self, field: &str) -> Result<String> {
        match self {
            Self::Text(s) => Ok(s),
            other => Err(other.mismatch(field, "text")),
        }
    }

    /// Extracts a port value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigField`] naming `field` on a kind mismatch.
    pub fn into_port(self, field: &str) -> Result<u16> {
        match self {
            Self::Port(p) => Ok(p),
            other => Err(other.mismatch(field, "port")),
        }
    }

    /// Extracts an access-key list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigField`] naming `field` on a kind mismatch.
    pub fn into_keys(self, field: &str) -> Result<Vec<String>> {
        match self {
            Self::Keys(k) => Ok(k),
            other => Err(other.mismatch(field, "keys")),
        }
    }

    /// Extracts a store handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigField`] naming `field` on a kind mismatch.
    pub fn into_store(self, field: &str) -> Result<StoreHandle> {
        match self {
            Self::Store(h) => Ok(h),
            other => Err(other.mismatch(field, "store")),
        }
    }

    /// Extracts a logger list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigField`] naming `field` on a kind mismatch.
    pub fn into_loggers(self, field: &str) -> Result<Vec<Arc<dyn EventLogger>>> {
        match self {
            Self::Loggers(l) => Ok(l),
            other => Err(other.mismatch(field, "loggers")),
        }
    }
}

/// The fields resolved so far, in declaration order.
///
/// Passed to each resolver so later fields can consult earlier ones.
#[derive(Debug, Default)]
pub struct ResolvedFields {
    values: HashMap<String, FieldValue>,
}

impl ResolvedFields {
    /// Looks up an already-resolved field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Removes and returns a resolved field.
    pub fn take(&mut self, name: &str) -> Option<FieldValue> {
        self.values.remove(name)
    }

    fn insert(&mut self, name: &str, value: FieldValue) {
        self.values.insert(name.to_string(), value);
    }
}

/// Whether a field must appear in the raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Absence fails resolution with [`Error::MissingField`].
    Required,
    /// Absence takes the field's default.
    Optional,
}

type Resolver<'a> = Box<dyn Fn(&Value, &ResolvedFields) -> Result<FieldValue> + Send + Sync + 'a>;
type DefaultFn<'a> = Box<dyn Fn() -> Result<FieldValue> + Send + Sync + 'a>;

/// Declarative description of one configuration field.
///
/// The lifetime ties resolvers to the registries they borrow.
pub struct FieldSpec<'a> {
    name: &'static str,
    requirement: Requirement,
    resolver: Resolver<'a>,
    default: Option<DefaultFn<'a>>,
}

impl<'a> FieldSpec<'a> {
    /// Declares a required field.
    pub fn required(
        name: &'static str,
        resolver: impl Fn(&Value, &ResolvedFields) -> Result<FieldValue> + Send + Sync + 'a,
    ) -> Self {
        Self {
            name,
            requirement: Requirement::Required,
            resolver: Box::new(resolver),
            default: None,
        }
    }

    /// Declares an optional field with a default-producing function.
    ///
    /// The default is computed lazily, once per resolution, so no default
    /// instance is ever shared across configurations.
    pub fn optional(
        name: &'static str,
        resolver: impl Fn(&Value, &ResolvedFields) -> Result<FieldValue> + Send + Sync + 'a,
        default: impl Fn() -> Result<FieldValue> + Send + Sync + 'a,
    ) -> Self {
        Self {
            name,
            requirement: Requirement::Optional,
            resolver: Box::new(resolver),
            default: Some(Box::new(default)),
        }
    }

    /// The field's name in the raw input.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// An ordered list of field specs validating a raw configuration mapping.
pub struct Schema<'a> {
    fields: Vec<FieldSpec<'a>>,
}

impl<'a> Schema<'a> {
    /// Creates a schema resolving fields in the given order.
    ///
    /// Order matters: a field whose resolver consults another field (the
    /// `"store"` logger alias) must be declared after it.
    #[must_use]
    pub fn new(fields: Vec<FieldSpec<'a>>) -> Self {
        Self { fields }
    }

    /// Validates and resolves a raw configuration mapping.
    ///
    /// Resolution is total: every declared field ends up with a concrete,
    /// typed value or the whole resolution fails.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingField`] for an absent required field.
    /// - [`Error::ConfigField`] for a resolver or default failure, a
    ///   reference to a not-yet-resolved field, or a kind mismatch.
    /// - [`Error::UnknownScheme`] / [`Error::ComponentInit`] surfaced
    ///   unwrapped from descriptor resolution inside a resolver.
    pub fn resolve(&self, raw: &serde_json::Map<String, Value>) -> Result<ResolvedFields> {
        let mut resolved = ResolvedFields::default();

        for field in &self.fields {
            let value = match raw.get(field.name) {
                Some(value) => {
                    (field.resolver)(value, &resolved).map_err(|e| Self::wrap(field.name, e))?
                }
                None => match field.requirement {
                    Requirement::Required => {
                        return Err(Error::MissingField {
                            field: field.name.to_string(),
                        })
                    }
                    Requirement::Optional => {
                        let default = field.default.as_ref().ok_or_else(|| Error::ConfigField {
                            field: field.name.to_string(),
                            cause: "optional field declared without a default".to_string(),
                        })?;
                        default().map_err(|e| Self::wrap(field.name, e))?
                    }
                },
            };

            // A reference marker aliases the instance already bound to the
            // referenced field, never a fresh construction.
            let value = match value {
                FieldValue::Reference(target) => resolved
                    .get(&target)
                    .cloned()
                    .ok_or_else(|| Error::ConfigField {
                        field: field.name.to_string(),
                        cause: format!("references field '{target}' which is not resolved yet"),
                    })?,
                value => value,
            };

            resolved.insert(field.name, value);
        }

        Ok(resolved)
    }

    /// Wraps generic resolver failures as `ConfigField` naming the field;
    /// scheme and constructor errors keep their own shape.
    fn wrap(field: &str, err: Error) -> Error {
        match err {
            e @ (Error::UnknownScheme { .. }
            | Error::ComponentInit { .. }
            | Error::MissingField { .. }
            | Error::ConfigField { .. }) => e,
            other => Error::ConfigField {
                field: field.to_string(),
                cause: other.to_string(),
            },
        }
    }
}

/// Coerces a raw JSON value into [`FieldValue::Text`].
///
/// # Errors
///
/// Returns [`Error::ConfigField`] if the value is not a string.
pub fn text_resolver(
    name: &'static str,
) -> impl Fn(&Value, &ResolvedFields) -> Result<FieldValue> + Send + Sync + 'static {
    move |value, _| {
        value
            .as_str()
            .map(|s| FieldValue::Text(s.to_string()))
            .ok_or_else(|| Error::ConfigField {
                field: name.to_string(),
                cause: format!("expected a string, got {value}"),
            })
    }
}

/// Coerces a raw JSON value into [`FieldValue::Port`].
///
/// # Errors
///
/// Returns [`Error::ConfigField`] if the value is not an integer in port range.
pub fn port_resolver(
    name: &'static str,
) -> impl Fn(&Value, &ResolvedFields) -> Result<FieldValue> + Send + Sync + 'static {
    move |value, _| {
        value
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .map(FieldValue::Port)
            .ok_or_else(|| Error::ConfigField {
                field: name.to_string(),
                cause: format!("expected a port number, got {value}"),
            })
    }
}

/// Coerces a raw JSON value into [`FieldValue::Keys`].
///
/// # Errors
///
/// Returns [`Error::ConfigField`] if the value is not a list of strings.
pub fn keys_resolver(
    name: &'static str,
) -> impl Fn(&Value, &ResolvedFields) -> Result<FieldValue> + Send + Sync + 'static {
    move |value, _| {
        let items = value.as_array().ok_or_else(|| Error::ConfigField {
            field: name.to_string(),
            cause: format!("expected a list of strings, got {value}"),
        })?;
        let keys = items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(ToString::to_string)
                    .ok_or_else(|| Error::ConfigField {
                        field: name.to_string(),
                        cause: format!("expected a string key, got {item}"),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FieldValue::Keys(keys))
    }
}
