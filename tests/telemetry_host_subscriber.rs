//! Integration test for `telemetry::init` inside an app that already logs
//!
//! Runs in its own test binary so the process-wide subscriber state is not
//! shared with other tests.

use tracing_subscriber::util::SubscriberInitExt;

#[test]
fn test_init_leaves_existing_global_subscriber_in_place() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .finish()
        .try_init()
        .expect("first subscriber in this process");

    meter_filter::telemetry::init("debug");

    // The host subscriber still decides verbosity
    assert!(!tracing::enabled!(tracing::Level::DEBUG));
    assert!(tracing::enabled!(tracing::Level::WARN));
}
