//! Internal diagnostics setup.
//!
//! This is process telemetry (`tracing`), distinct from the domain's audit
//! trail in [`crate::audit`]. The embedding process calls [`init`] once at
//! startup; repeated calls are harmless.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static INIT: OnceLock<()> = OnceLock::new();

/// Installs a `tracing` subscriber filtered by `SICDS_LOG` (falling back to
/// `info`). Safe to call more than once; only the first call installs.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_env("SICDS_LOG")
            .unwrap_or_else(|_| EnvFilter::new("info"));
        // Ignore failure: the embedding process may have installed its own.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
    }
}
