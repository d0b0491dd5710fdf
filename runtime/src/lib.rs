//! # Reqsync Runtime
//!
//! The coordinator for the reqsync request-state store.
//!
//! [`RequestStore`] turns triggers into state transitions around an external
//! asynchronous operation: it applies the per-instance concurrency policy,
//! patches state to the busy phase synchronously, drives the operation on
//! Tokio, classifies failures at the boundary, and publishes every state
//! change through a watch channel that the [`selector`] layer projects into
//! deduplicated, read-only views.
//!
//! ## Example
//!
//! ```ignore
//! use reqsync_core::from_fn;
//! use reqsync_runtime::RequestStore;
//!
//! let store = RequestStore::query(from_fn(|page: u32| async move {
//!     api.load_users(page).await
//! }));
//!
//! store.trigger(0);
//! assert!(store.is_loading());
//!
//! let state = store.settled().await?;
//! let users = state.data().cloned().unwrap_or_default();
//! ```
//!
//! Operation failures never escape as panics or errors: every rejection is
//! classified and lands in the `Error` phase, optionally visiting the
//! trigger's `on_error` callback.

use std::time::Duration;

use reqsync_core::policy::{ConcurrencyPolicy, FailurePolicy, OperationKind};

/// Metric registration and macro re-exports
pub mod metrics;

/// Retry with exponential backoff for transient operation failures
pub mod retry;

/// Derived, deduplicated read-only views over store state
pub mod selector;

/// The request coordinator
pub mod store;

use retry::RetryPolicy;

/// Error types for the store's auxiliary wait surface
pub mod error {
    use thiserror::Error;

    /// Errors surfaced when observing a store.
    ///
    /// Triggering and resetting are infallible by design; only the waiting
    /// helpers (`settled_within`, selector `changed`) can fail.
    #[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
    pub enum StoreError {
        /// The deadline expired before the store settled
        #[error("timed out waiting for the store to settle")]
        Timeout,

        /// The state channel closed because the store was dropped
        #[error("state channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;
pub use selector::Selector;
pub use store::RequestStore;

/// Configuration for a store instance.
///
/// Every behavioral choice of the coordinator is made here, explicitly, at
/// construction; nothing is resolved from ambient context.
///
/// # Example
///
/// ```
/// use reqsync_core::policy::{ConcurrencyPolicy, FailurePolicy};
/// use reqsync_runtime::StoreConfig;
///
/// let config = StoreConfig::query().with_failure_policy(FailurePolicy::RetainData);
/// assert_eq!(config.concurrency, ConcurrencyPolicy::Switch);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Whether the operation reads or mutates (decides busy/success phases)
    pub kind: OperationKind,

    /// Concurrency discipline for triggers arriving while busy
    pub concurrency: ConcurrencyPolicy,

    /// Whether a failure clears previously loaded data
    pub on_failure: FailurePolicy,

    /// Retry policy applied before classification; defaults to no retries so
    /// each accepted trigger performs exactly one operation invocation
    pub retry: RetryPolicy,
}

impl StoreConfig {
    /// Configuration for a read store: `Loading`/`Loaded` phases, switch
    /// concurrency, data cleared on failure, no retries.
    #[must_use]
    pub const fn query() -> Self {
        Self::for_kind(OperationKind::Query)
    }

    /// Configuration for a mutating store: `Saving`/`Saved` phases, exhaust
    /// concurrency, data cleared on failure, no retries.
    #[must_use]
    pub const fn mutation() -> Self {
        Self::for_kind(OperationKind::Mutation)
    }

    /// Configuration with the default policies for an operation kind.
    #[must_use]
    pub const fn for_kind(kind: OperationKind) -> Self {
        Self {
            kind,
            concurrency: kind.default_concurrency(),
            on_failure: FailurePolicy::ClearData,
            retry: RetryPolicy::none(),
        }
    }

    /// Override the concurrency policy.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: ConcurrencyPolicy) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Override the failure data-retention policy.
    #[must_use]
    pub const fn with_failure_policy(mut self, on_failure: FailurePolicy) -> Self {
        self.on_failure = on_failure;
        self
    }

    /// Set a retry policy for transient failures.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::query()
    }
}

/// Default deadline used by [`RequestStore::settled_within`] callers that
/// just want "a generous bound" in tests and demos.
pub const DEFAULT_SETTLE_DEADLINE: Duration = Duration::from_secs(5);
