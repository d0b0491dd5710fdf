//! # Reqsync Testing
//!
//! Testing utilities for reqsync stores.
//!
//! This crate provides:
//! - [`ScriptedOp`]: a scripted operation that replays queued results with
//!   optional delays and counts invocations
//! - [`StatusFailure`]: a raw failure fixture carrying an optional HTTP-like
//!   status code
//! - Settle and tracing helpers for deterministic async tests
//!
//! ## Example
//!
//! ```ignore
//! use reqsync_runtime::RequestStore;
//! use reqsync_testing::{ScriptedOp, settle};
//!
//! #[tokio::test]
//! async fn loads_the_first_page() {
//!     let op = ScriptedOp::new().then_ok(vec![1u32, 2]);
//!     let probe = op.clone();
//!     let store = RequestStore::query(op);
//!
//!     store.trigger(0u32);
//!     let state = settle(&store).await.unwrap();
//!
//!     assert_eq!(state.data(), Some(&vec![1, 2]));
//!     assert_eq!(probe.calls(), 1);
//! }
//! ```

use reqsync_runtime::{DEFAULT_SETTLE_DEADLINE, RequestStore, StoreError};
use reqsync_core::state::RequestState;

/// Mock operations and failure fixtures
pub mod mocks {
    use futures::future::BoxFuture;
    use reqsync_core::classify::StatusCoded;
    use reqsync_core::operation::Operation;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::Duration;

    /// A raw failure carrying an optional HTTP-like status code.
    ///
    /// Stands in for the rejection type of a real HTTP/GraphQL client:
    /// `with_status(404)` classifies as not-found, any other status (or no
    /// status at all, as with a connection loss) classifies as a general
    /// error.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFailure {
        status: Option<u16>,
    }

    impl StatusFailure {
        /// A failure with the given status code.
        #[must_use]
        pub const fn with_status(status: u16) -> Self {
            Self {
                status: Some(status),
            }
        }

        /// A status-less failure, like a dropped connection.
        #[must_use]
        pub const fn network() -> Self {
            Self { status: None }
        }
    }

    impl StatusCoded for StatusFailure {
        fn status(&self) -> Option<u16> {
            self.status
        }
    }

    impl std::fmt::Display for StatusFailure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self.status {
                Some(status) => write!(f, "operation failed with status {status}"),
                None => write!(f, "operation failed without a status"),
            }
        }
    }

    impl std::error::Error for StatusFailure {}

    struct Step<T> {
        delay: Duration,
        result: Result<T, StatusFailure>,
    }

    /// A scripted operation replaying queued results in order.
    ///
    /// Each invocation consumes the next step, sleeping its delay before
    /// resolving. Invocations are counted so tests can assert how many times
    /// the store actually called the operation (the exhaust-policy drop
    /// property). An exhausted script resolves to a status-less failure so a
    /// miscounted test fails loudly instead of hanging.
    ///
    /// Clones share the same script and counter; keep a clone as a probe
    /// before moving the operation into a store.
    pub struct ScriptedOp<T> {
        steps: Arc<Mutex<VecDeque<Step<T>>>>,
        calls: Arc<AtomicUsize>,
    }

    impl<T> ScriptedOp<T> {
        /// Create an operation with an empty script.
        #[must_use]
        pub fn new() -> Self {
            Self {
                steps: Arc::new(Mutex::new(VecDeque::new())),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Queue an immediate success.
        #[must_use]
        pub fn then_ok(self, value: T) -> Self {
            self.push(Duration::ZERO, Ok(value))
        }

        /// Queue a success resolving after a delay.
        #[must_use]
        pub fn then_ok_after(self, delay: Duration, value: T) -> Self {
            self.push(delay, Ok(value))
        }

        /// Queue an immediate failure with the given status code.
        #[must_use]
        pub fn then_err(self, status: u16) -> Self {
            self.push(Duration::ZERO, Err(StatusFailure::with_status(status)))
        }

        /// Queue a failure with the given status resolving after a delay.
        #[must_use]
        pub fn then_err_after(self, delay: Duration, status: u16) -> Self {
            self.push(delay, Err(StatusFailure::with_status(status)))
        }

        /// Queue an immediate status-less failure.
        #[must_use]
        pub fn then_network_err(self) -> Self {
            self.push(Duration::ZERO, Err(StatusFailure::network()))
        }

        /// Number of times the operation has been invoked.
        #[must_use]
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Number of script steps not yet consumed.
        #[must_use]
        pub fn remaining(&self) -> usize {
            self.steps
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }

        fn push(self, delay: Duration, result: Result<T, StatusFailure>) -> Self {
            self.steps
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(Step { delay, result });
            self
        }
    }

    impl<T> Default for ScriptedOp<T> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<T> Clone for ScriptedOp<T> {
        fn clone(&self) -> Self {
            Self {
                steps: Arc::clone(&self.steps),
                calls: Arc::clone(&self.calls),
            }
        }
    }

    impl<P, T> Operation<P> for ScriptedOp<T>
    where
        T: Send + 'static,
    {
        type Output = T;
        type Failure = StatusFailure;

        fn call(&self, _params: P) -> BoxFuture<'static, Result<T, StatusFailure>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self
                .steps
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();

            Box::pin(async move {
                match step {
                    Some(step) => {
                        if !step.delay.is_zero() {
                            tokio::time::sleep(step.delay).await;
                        }
                        step.result
                    },
                    // Script ran dry: fail the test visibly
                    None => Err(StatusFailure::network()),
                }
            })
        }
    }

    impl<T> std::fmt::Debug for ScriptedOp<T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ScriptedOp")
                .field("remaining", &self.remaining())
                .field("calls", &self.calls())
                .finish()
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use std::sync::Once;

    /// Install a fmt tracing subscriber for test debugging.
    ///
    /// Idempotent; respects `RUST_LOG` via the env filter.
    pub fn init_test_tracing() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        });
    }
}

/// Wait for a store to settle, bounded by the default deadline.
///
/// Thin wrapper over `RequestStore::settled_within` so tests don't repeat
/// the deadline plumbing.
///
/// # Errors
///
/// Returns [`StoreError::Timeout`] if the store does not settle within the
/// default deadline.
pub async fn settle<P, T, E>(
    store: &RequestStore<P, T, E>,
) -> Result<RequestState<T, E>, StoreError>
where
    P: Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    store.settled_within(DEFAULT_SETTLE_DEADLINE).await
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::{ScriptedOp, StatusFailure};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use reqsync_core::classify::{ErrorKind, StatusCoded};
    use reqsync_core::operation::Operation;
    use std::time::Duration;

    #[tokio::test]
    async fn scripted_op_replays_in_order() {
        let op: ScriptedOp<u32> = ScriptedOp::new().then_ok(1).then_err(500).then_ok(2);

        assert_eq!(op.call(()).await, Ok(1));
        assert_eq!(op.call(()).await, Err(StatusFailure::with_status(500)));
        assert_eq!(op.call(()).await, Ok(2));
        assert_eq!(op.calls(), 3);
        assert_eq!(op.remaining(), 0);
    }

    #[tokio::test]
    async fn exhausted_script_fails_instead_of_hanging() {
        let op: ScriptedOp<u32> = ScriptedOp::new();
        assert_eq!(op.call(()).await, Err(StatusFailure::network()));
    }

    #[tokio::test]
    async fn clones_share_script_and_counter() {
        let op: ScriptedOp<u32> = ScriptedOp::new().then_ok(1);
        let probe = op.clone();

        assert_eq!(op.call(()).await, Ok(1));
        assert_eq!(probe.calls(), 1);
        assert_eq!(probe.remaining(), 0);
    }

    #[tokio::test]
    async fn delayed_step_waits() {
        let op: ScriptedOp<u32> =
            ScriptedOp::new().then_ok_after(Duration::from_millis(20), 7);
        let started = std::time::Instant::now();
        assert_eq!(op.call(()).await, Ok(7));
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn status_failure_classifies() {
        assert_eq!(
            StatusFailure::with_status(404).classify(),
            ErrorKind::NotFound
        );
        assert_eq!(
            StatusFailure::with_status(500).classify(),
            ErrorKind::General
        );
        assert_eq!(StatusFailure::network().classify(), ErrorKind::General);
    }
}
