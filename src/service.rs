//! Per-request duplicate-check and administrative operations.
//!
//! [`DedupService`] composes a resolved [`ServiceConfig`] into the two
//! operations the transport layer calls: [`DedupService::check`] for ordinary
//! requests and [`DedupService::clear`] for the superkey-gated reset. The
//! store decision is authoritative and request-fatal on failure; audit
//! logging is fire-and-forget relative to it.

use crate::config::ServiceConfig;
use crate::models::{AttributeSet, CheckOutcome, RequestContext};
use crate::{Error, Result};

/// The duplicate-identification service core.
pub struct DedupService {
    config: ServiceConfig,
}

impl DedupService {
    /// Creates a service over a resolved configuration.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    /// Returns the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Checks an attribute set and records it if unseen.
    ///
    /// The check and the record are one atomic store operation, so two
    /// concurrent submissions of identical content observe exactly one
    /// "unique" outcome between them.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] if `key` is not a configured access key.
    /// - [`Error::StoreFailed`] if the backend could not decide; the request
    ///   fails rather than guessing.
    ///
    /// Both failures are reported to the audit loggers best-effort before
    /// returning.
    pub fn check(
        &self,
        ctx: &RequestContext,
        key: &str,
        attrs: &AttributeSet,
    ) -> Result<CheckOutcome> {
        if !self.config.keys.contains(key) {
            let err = Error::Unauthorized("unrecognized access key".to_string());
            self.log_error(ctx, &err.to_string());
            return Err(err);
        }

        let newly_recorded = match self.config.store.store().check_and_add(attrs) {
            Ok(newly_recorded) => newly_recorded,
            Err(err) => {
                self.log_error(ctx, &err.to_string());
                return Err(err);
            }
        };

        let attributes = attrs.attributes().to_vec();
        let outcome = if newly_recorded {
            CheckOutcome::all_unique(attributes)
        } else {
            CheckOutcome::all_duplicate(attributes)
        };

        self.log_success(ctx, &outcome);
        Ok(outcome)
    }

    /// Resets the store to empty. Requires the administrative superkey.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] if `superkey` does not match; ordinary
    ///   access keys do not authorize a clear.
    /// - [`Error::StoreFailed`] if the backend could not clear.
    pub fn clear(&self, ctx: &RequestContext, superkey: &str) -> Result<()> {
        if superkey != self.config.superkey {
            let err = Error::Unauthorized("superkey required to clear the store".to_string());
            self.log_error(ctx, &err.to_string());
            return Err(err);
        }

        match self.config.store.store().clear() {
            Ok(()) => {
                tracing::info!("duplicate store cleared");
                Ok(())
            }
            Err(err) => {
                self.log_error(ctx, &err.to_string());
                Err(err)
            }
        }
    }

    /// Fans a success entry out to every configured logger.
    ///
    /// A slow or failing logger must not fail the decision already made, so
    /// failures are demoted to warnings.
    fn log_success(&self, ctx: &RequestContext, outcome: &CheckOutcome) {
        for logger in &self.config.loggers {
            if let Err(err) = logger.record_success(ctx, outcome) {
                tracing::warn!(error = %err, "audit logger failed to record success");
            }
        }
    }

    fn log_error(&self, ctx: &RequestContext, message: &str) {
        for logger in &self.config.loggers {
            if let Err(err) = logger.record_error(ctx, message) {
                tracing::warn!(error = %err, "audit logger failed to record error");
            }
        }
    }
}
