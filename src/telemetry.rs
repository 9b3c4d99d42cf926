//! Logging setup
//!
//! Filters log through `tracing`. Applications embedding the crate normally
//! install their own subscriber; `init` is a convenience for those that don't.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize a tracing subscriber for structured logging
///
/// This can only take effect once per process. Subsequent calls are silently
/// ignored, as is the case where another global subscriber is already set.
///
/// Reads the filter from `RUST_LOG`, defaulting to `meter_filter=<default_level>`.
///
/// # Examples
///
/// ```no_run
/// meter_filter::telemetry::init("debug");
/// tracing::info!("Filter chain ready");
/// ```
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("meter_filter={}", default_level)));

        // Err means the host already installed a global subscriber; keep theirs
        if let Err(e) = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
        {
            tracing::debug!(error = %e, "Global subscriber already set, leaving it in place");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init("debug");
        init("trace");
        tracing::debug!("telemetry initialized twice without panicking");
    }
}
