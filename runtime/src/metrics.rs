//! Metrics for observability.
//!
//! The store instruments itself through the `metrics` facade; the host
//! application decides which recorder/exporter to install. Call
//! [`register_metrics`] once at startup to attach descriptions and units.

use metrics::{Unit, describe_counter, describe_histogram};

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Triggers accepted, labelled by concurrency policy.
pub const TRIGGERS: &str = "request_store.triggers";

/// Triggers dropped by the exhaust policy while an operation was in flight.
pub const TRIGGERS_DROPPED: &str = "request_store.triggers.dropped";

/// Applied completions, labelled by outcome (`success`/`error`).
pub const COMPLETIONS: &str = "request_store.completions";

/// Completions discarded because a later trigger or reset superseded them.
pub const SUPERSEDED: &str = "request_store.superseded";

/// Operation retries performed under a retry policy.
pub const RETRIES: &str = "request_store.retries";

/// Store resets.
pub const RESETS: &str = "request_store.resets";

/// External operation duration, per attempt.
pub const OPERATION_DURATION: &str = "request_store.operation.duration_seconds";

/// Register descriptions for all store metrics.
///
/// Idempotent; safe to call from multiple stores.
pub fn register_metrics() {
    describe_counter!(TRIGGERS, "Triggers accepted by the store");
    describe_counter!(
        TRIGGERS_DROPPED,
        "Triggers dropped by the exhaust policy while busy"
    );
    describe_counter!(COMPLETIONS, "Operation completions applied to state");
    describe_counter!(
        SUPERSEDED,
        "Operation completions discarded after being superseded"
    );
    describe_counter!(RETRIES, "Operation retries performed");
    describe_counter!(RESETS, "Store resets");
    describe_histogram!(
        OPERATION_DURATION,
        Unit::Seconds,
        "External operation duration per attempt"
    );
}
