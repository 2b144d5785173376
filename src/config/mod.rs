//! Configuration management.
//!
//! Raw configuration comes in as a mapping (JSON or TOML file, or a
//! [`RawConfig`] built in code) and leaves resolution as a fully-typed
//! [`ServiceConfig`]: one shared store instance, one or more audit loggers,
//! the access keys, the administrative superkey, and network-binding
//! parameters. Resolution is total and startup-fatal on any failure, so a
//! service never starts with a partially-initialized configuration.

mod descriptor;
mod registry;
mod schema;

pub use descriptor::Descriptor;
pub use registry::{Constructor, ConstructorError, Registration, Registry, Resolution};
pub use schema::{
    keys_resolver, port_resolver, text_resolver, FieldSpec, FieldValue, Requirement,
    ResolvedFields, Schema,
};

use crate::audit::{EventLogger, FileLogger, NullLogger};
use crate::storage::{MemoryStore, SqliteStore, StoreHandle};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Default bind host.
pub const DEFAULT_HOST: &str = "localhost";
/// Default bind port.
pub const DEFAULT_PORT: u16 = 8625;
/// Default access key installed when none are configured.
pub const DEFAULT_KEY: &str = "sicds_default_key";

/// Raw configuration mapping, prior to validation.
///
/// Every field is optional at this stage; [`ServiceConfig::resolve`] enforces
/// which are required. `store` and `loggers` hold scheme descriptors, not
/// constructed components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    /// Bind host for the transport layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Bind port for the transport layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Ordinary access keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
    /// Administrative superkey.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superkey: Option<String>,
    /// Duplicate-store scheme descriptor, e.g. `tmp:` or `sqlite:///p`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    /// Audit-logger scheme descriptors, e.g. `null:`, `file:///p`, `store:`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loggers: Option<Vec<String>>,
}

impl RawConfig {
    /// Loads a raw configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigField`] if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigField {
            field: "config".to_string(),
            cause: format!("read '{}': {e}", path.display()),
        })?;
        serde_json::from_str(&contents).map_err(|e| Error::ConfigField {
            field: "config".to_string(),
            cause: format!("parse '{}': {e}", path.display()),
        })
    }

    /// Loads a raw configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigField`] if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigField {
            field: "config".to_string(),
            cause: format!("read '{}': {e}", path.display()),
        })?;
        toml::from_str(&contents).map_err(|e| Error::ConfigField {
            field: "config".to_string(),
            cause: format!("parse '{}': {e}", path.display()),
        })
    }

    fn to_map(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => Err(Error::ConfigField {
                field: "config".to_string(),
                cause: "configuration did not serialize to a mapping".to_string(),
            }),
        }
    }
}

/// Builds the reference store registry.
///
/// | Scheme | Backend |
/// |--------|---------|
/// | absent / empty | in-memory store |
/// | `tmp` | in-memory store |
/// | `sqlite` | durable store at the descriptor path |
#[must_use]
pub fn default_store_registry() -> Registry<StoreHandle> {
    let mut registry = Registry::new();
    registry.register_default(|_| Ok(StoreHandle::with_logger(Arc::new(MemoryStore::new()))));
    registry.register("tmp", |_| {
        Ok(StoreHandle::with_logger(Arc::new(MemoryStore::new())))
    });
    registry.register("sqlite", |descriptor| {
        let store = SqliteStore::open(descriptor.path())?;
        Ok(StoreHandle::with_logger(Arc::new(store)))
    });
    registry
}

/// Builds the reference logger registry.
///
/// | Scheme | Backend |
/// |--------|---------|
/// | absent / empty | standard-output logger |
/// | `null` | no-op logger |
/// | `file` | file logger at the descriptor path |
/// | `store` | alias to the resolved `store` field |
#[must_use]
pub fn default_logger_registry() -> Registry<Arc<dyn EventLogger>> {
    let mut registry = Registry::new();
    registry.register_default(|_| Ok(Arc::new(FileLogger::stdout()) as Arc<dyn EventLogger>));
    registry.register("null", |_| {
        Ok(Arc::new(NullLogger::new()) as Arc<dyn EventLogger>)
    });
    registry.register("file", |descriptor| {
        let logger = FileLogger::open(descriptor.path())?;
        Ok(Arc::new(logger) as Arc<dyn EventLogger>)
    });
    registry.register_reference("store", "store");
    registry
}

/// The fully resolved, validated service configuration.
///
/// Constructed once at startup and read-only for the process lifetime; the
/// store's internal dedup state is the only thing that mutates afterwards,
/// and only through the [`DuplicateStore`](crate::DuplicateStore) contract.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Administrative superkey authorizing store clears.
    pub superkey: String,
    /// The one shared duplicate-store instance.
    pub store: StoreHandle,
    /// Bind host for the transport layer.
    pub host: String,
    /// Bind port for the transport layer.
    pub port: u16,
    /// Ordinary access keys.
    pub keys: HashSet<String>,
    /// Audit loggers, in configured order.
    pub loggers: Vec<Arc<dyn EventLogger>>,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("keys", &self.keys.len())
            .field("loggers", &self.loggers.len())
            .finish_non_exhaustive()
    }
}

impl ServiceConfig {
    /// Resolves a raw configuration against the reference registries.
    ///
    /// # Errors
    ///
    /// Any startup-fatal configuration error: [`Error::MissingField`],
    /// [`Error::ConfigField`], [`Error::UnknownScheme`], or
    /// [`Error::ComponentInit`].
    pub fn resolve(raw: &RawConfig) -> Result<Self> {
        Self::resolve_with(raw, &default_store_registry(), &default_logger_registry())
    }

    /// Resolves a raw configuration against caller-supplied registries.
    ///
    /// Registries are explicit values so deployments can add or replace
    /// backends without touching this crate.
    ///
    /// # Errors
    ///
    /// See [`ServiceConfig::resolve`].
    pub fn resolve_with(
        raw: &RawConfig,
        stores: &Registry<StoreHandle>,
        loggers: &Registry<Arc<dyn EventLogger>>,
    ) -> Result<Self> {
        let schema = service_schema(stores, loggers);
        let mut fields = schema.resolve(&raw.to_map()?)?;

        let take = |fields: &mut ResolvedFields, name: &str| {
            fields.take(name).ok_or_else(|| Error::ConfigField {
                field: name.to_string(),
                cause: "field missing after resolution".to_string(),
            })
        };

        let config = Self {
            superkey: take(&mut fields, "superkey")?.into_text("superkey")?,
            store: take(&mut fields, "store")?.into_store("store")?,
            host: take(&mut fields, "host")?.into_text("host")?,
            port: take(&mut fields, "port")?.into_port("port")?,
            keys: take(&mut fields, "keys")?
                .into_keys("keys")?
                .into_iter()
                .collect(),
            loggers: take(&mut fields, "loggers")?.into_loggers("loggers")?,
        };

        tracing::debug!(
            host = %config.host,
            port = config.port,
            keys = config.keys.len(),
            loggers = config.loggers.len(),
            "resolved service configuration"
        );
        Ok(config)
    }
}

/// Builds the service configuration schema over the given registries.
///
/// Field order is the resolution order: `store` resolves before `loggers` so
/// the `"store"` logger alias can bind to the already-constructed instance.
fn service_schema<'r>(
    stores: &'r Registry<StoreHandle>,
    loggers: &'r Registry<Arc<dyn EventLogger>>,
) -> Schema<'r> {
    Schema::new(vec![
        FieldSpec::required("superkey", text_resolver("superkey")),
        FieldSpec::required("store", {
            move |value: &serde_json::Value, _: &ResolvedFields| {
                let descriptor = value.as_str().ok_or_else(|| Error::ConfigField {
                    field: "store".to_string(),
                    cause: format!("expected a descriptor string, got {value}"),
                })?;
                match stores.resolve(Some(descriptor))? {
                    Resolution::Component(handle) => Ok(FieldValue::Store(handle)),
                    Resolution::Reference(field) => Ok(FieldValue::Reference(field)),
                }
            }
        }),
        FieldSpec::optional("host", text_resolver("host"), || {
            Ok(FieldValue::Text(DEFAULT_HOST.to_string()))
        }),
        FieldSpec::optional("port", port_resolver("port"), || {
            Ok(FieldValue::Port(DEFAULT_PORT))
        }),
        FieldSpec::optional("keys", keys_resolver("keys"), || {
            Ok(FieldValue::Keys(vec![DEFAULT_KEY.to_string()]))
        }),
        FieldSpec::optional(
            "loggers",
            {
                move |value: &serde_json::Value, resolved: &ResolvedFields| {
                    let items = value.as_array().ok_or_else(|| Error::ConfigField {
                        field: "loggers".to_string(),
                        cause: format!("expected a list of descriptors, got {value}"),
                    })?;
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        let descriptor = item.as_str().ok_or_else(|| Error::ConfigField {
                            field: "loggers".to_string(),
                            cause: format!("expected a descriptor string, got {item}"),
                        })?;
                        match loggers.resolve(Some(descriptor))? {
                            Resolution::Component(logger) => out.push(logger),
                            Resolution::Reference(field) => {
                                out.push(resolve_logger_alias(resolved, &field)?);
                            }
                        }
                    }
                    Ok(FieldValue::Loggers(out))
                }
            },
            // A fresh stdout logger per resolution, never a shared instance.
            || {
                Ok(FieldValue::Loggers(vec![
                    Arc::new(FileLogger::stdout()) as Arc<dyn EventLogger>
                ]))
            },
        ),
    ])
}

/// Resolves a `"store"`-style logger alias to the audit view of an
/// already-resolved field.
fn resolve_logger_alias(
    resolved: &ResolvedFields,
    field: &str,
) -> Result<Arc<dyn EventLogger>> {
    match resolved.get(field) {
        Some(FieldValue::Store(handle)) => {
            handle.logger().ok_or_else(|| Error::ConfigField {
                field: "loggers".to_string(),
                cause: format!("store referenced by '{field}' does not support audit logging"),
            })
        }
        Some(other) => Err(Error::ConfigField {
            field: "loggers".to_string(),
            cause: format!(
                "referenced field '{field}' resolved to {other:?}, not a store"
            ),
        }),
        None => Err(Error::ConfigField {
            field: "loggers".to_string(),
            cause: format!("references field '{field}' which is not resolved yet"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> RawConfig {
        RawConfig {
            superkey: Some("S".to_string()),
            store: Some("tmp:".to_string()),
            ..RawConfig::default()
        }
    }

    #[test]
    fn test_minimal_config_takes_documented_defaults() {
        let config = ServiceConfig::resolve(&minimal()).unwrap();
        assert_eq!(config.superkey, "S");
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.keys.len(), 1);
        assert!(config.keys.contains(DEFAULT_KEY));
        assert_eq!(config.loggers.len(), 1);
    }

    #[test]
    fn test_missing_superkey_is_fatal() {
        let raw = RawConfig {
            store: Some("tmp:".to_string()),
            ..RawConfig::default()
        };
        let err = ServiceConfig::resolve(&raw).unwrap_err();
        assert!(matches!(err, Error::MissingField { field } if field == "superkey"));
    }

    #[test]
    fn test_missing_store_is_fatal() {
        let raw = RawConfig {
            superkey: Some("S".to_string()),
            ..RawConfig::default()
        };
        let err = ServiceConfig::resolve(&raw).unwrap_err();
        assert!(matches!(err, Error::MissingField { field } if field == "store"));
    }

    #[test]
    fn test_unknown_store_scheme_is_fatal() {
        let raw = RawConfig {
            superkey: Some("S".to_string()),
            store: Some("bogus:".to_string()),
            ..RawConfig::default()
        };
        let err = ServiceConfig::resolve(&raw).unwrap_err();
        assert!(matches!(err, Error::UnknownScheme { scheme } if scheme == "bogus"));
    }

    #[test]
    fn test_bad_sqlite_path_reports_component_init() {
        let raw = RawConfig {
            superkey: Some("S".to_string()),
            store: Some("sqlite:///nonexistent/deeply/nested/dedup.db".to_string()),
            ..RawConfig::default()
        };
        let err = ServiceConfig::resolve(&raw).unwrap_err();
        match err {
            Error::ComponentInit { descriptor, .. } => {
                assert_eq!(descriptor, "sqlite:///nonexistent/deeply/nested/dedup.db");
            }
            other => panic!("expected ComponentInit, got {other}"),
        }
    }

    #[test]
    fn test_store_logger_alias_is_identity_equal_to_store() {
        let raw = RawConfig {
            loggers: Some(vec!["store:".to_string()]),
            ..minimal()
        };
        let config = ServiceConfig::resolve(&raw).unwrap();
        assert_eq!(config.loggers.len(), 1);

        let store_ptr = Arc::as_ptr(&config.store.store()).cast::<()>();
        let logger_ptr = Arc::as_ptr(&config.loggers[0]).cast::<()>();
        assert_eq!(store_ptr, logger_ptr);
    }

    #[test]
    fn test_null_and_file_logger_schemes() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("audit.log");
        let raw = RawConfig {
            loggers: Some(vec![
                "null:".to_string(),
                format!("file://{}", log_path.display()),
            ]),
            ..minimal()
        };
        let config = ServiceConfig::resolve(&raw).unwrap();
        assert_eq!(config.loggers.len(), 2);
    }

    #[test]
    fn test_port_out_of_range_names_the_field() {
        let raw = RawConfig {
            port: None,
            ..minimal()
        };
        // Out-of-range ports cannot round-trip through RawConfig's u16, so
        // exercise the resolver through a hand-built mapping.
        let mut map = raw.to_map().unwrap();
        map.insert("port".to_string(), serde_json::json!(123_456));
        let stores = default_store_registry();
        let loggers = default_logger_registry();
        let schema = service_schema(&stores, &loggers);
        let err = schema.resolve(&map).unwrap_err();
        assert!(matches!(err, Error::ConfigField { field, .. } if field == "port"));
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sicds.toml");
        std::fs::write(
            &path,
            "superkey = \"S\"\nstore = \"tmp:\"\nport = 9000\nkeys = [\"k1\", \"k2\"]\n",
        )
        .unwrap();

        let raw = RawConfig::from_toml_file(&path).unwrap();
        let config = ServiceConfig::resolve(&raw).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.keys.len(), 2);
    }

    #[test]
    fn test_json_file_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sicds.json");
        std::fs::write(&path, r#"{"superkey": "S", "store": "tmp:"}"#).unwrap();

        let raw = RawConfig::from_json_file(&path).unwrap();
        let config = ServiceConfig::resolve(&raw).unwrap();
        assert_eq!(config.superkey, "S");
    }
}
