//! The request coordinator.
//!
//! [`RequestStore`] owns one [`RequestState`] and translates triggers into
//! state transitions around an external asynchronous [`Operation`]. State
//! lives behind a `tokio::sync::watch` channel: `send_modify` gives one
//! consumer-visible update per patch, and receivers feed the selector layer.
//!
//! Concurrency policies are enforced with two cheap primitives:
//!
//! - **Switch**: a monotonically increasing generation counter. Each trigger
//!   (and each reset) advances it; a completion is applied only if its
//!   generation still matches, so a superseded operation can finish without
//!   its result ever becoming observable.
//! - **Exhaust**: an in-flight flag claimed with a compare-and-swap before
//!   the operation starts and released by an RAII guard when it resolves.
//!   Losing triggers are dropped before the operation is invoked.

use crate::{StoreConfig, StoreError};
use futures::future::BoxFuture;
use reqsync_core::classify::{ErrorKind, StatusCoded};
use reqsync_core::operation::Operation;
use reqsync_core::phase::Phase;
use reqsync_core::policy::ConcurrencyPolicy;
use reqsync_core::state::RequestState;
use reqsync_core::trigger::{Trigger, TriggerOutcome};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;

use crate::metrics::{
    COMPLETIONS, OPERATION_DURATION, RESETS, RETRIES, SUPERSEDED, TRIGGERS, TRIGGERS_DROPPED,
};
use crate::selector::Selector;

type RunFn<P, T, E> = dyn Fn(P) -> BoxFuture<'static, Result<T, E>> + Send + Sync;

struct Inner<P, T, E> {
    run: Box<RunFn<P, T, E>>,
    state_tx: watch::Sender<RequestState<T, E>>,
    generation: AtomicU64,
    in_flight: Arc<AtomicBool>,
    config: StoreConfig,
}

/// A store tracking one asynchronous request through its lifecycle.
///
/// Owned by the presentation component that created it; cloning shares the
/// same underlying state (the clone is a handle, not a copy). All reads are
/// snapshots; all patches are serialized through the watch channel.
///
/// # Type Parameters
///
/// - `P`: operation parameters carried by each trigger
/// - `T`: successful payload type
/// - `E`: classified error type (defaults to [`ErrorKind`])
///
/// # Example
///
/// ```ignore
/// let store = RequestStore::query(from_fn(|page: u32| api.load_users(page)));
/// store.trigger(0);
/// let users = store.settled().await?.data().cloned().unwrap_or_default();
/// ```
pub struct RequestStore<P, T, E = ErrorKind> {
    inner: Arc<Inner<P, T, E>>,
}

impl<P, T> RequestStore<P, T, ErrorKind>
where
    P: Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Create a read store with the default query policies (switch
    /// concurrency, data cleared on failure) and status-based
    /// classification.
    pub fn query<Op>(op: Op) -> Self
    where
        Op: Operation<P, Output = T> + 'static,
        Op::Failure: StatusCoded,
    {
        Self::with_config(op, |raw: Op::Failure| raw.classify(), StoreConfig::query())
    }

    /// Create a mutating store with the default mutation policies (exhaust
    /// concurrency, data cleared on failure) and status-based
    /// classification.
    pub fn mutation<Op>(op: Op) -> Self
    where
        Op: Operation<P, Output = T> + 'static,
        Op::Failure: StatusCoded,
    {
        Self::with_config(
            op,
            |raw: Op::Failure| raw.classify(),
            StoreConfig::mutation(),
        )
    }
}

impl<P, T, E> RequestStore<P, T, E>
where
    P: Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create a store with an explicit configuration and error classifier.
    ///
    /// The classifier runs exactly once per operation resolution, at the
    /// boundary; raw failure details are never retained in state.
    pub fn with_config<Op, C>(op: Op, classify: C, config: StoreConfig) -> Self
    where
        Op: Operation<P, Output = T> + 'static,
        C: Fn(Op::Failure) -> E + Send + Sync + 'static,
    {
        let classify = Arc::new(classify);
        let run = Box::new(move |params: P| -> BoxFuture<'static, Result<T, E>> {
            let classify = Arc::clone(&classify);
            let fut = op.call(params);
            Box::pin(async move { fut.await.map_err(|raw| (*classify)(raw)) })
        });

        let (state_tx, _) = watch::channel(RequestState::idle());

        Self {
            inner: Arc::new(Inner {
                run,
                state_tx,
                generation: AtomicU64::new(0),
                in_flight: Arc::new(AtomicBool::new(false)),
                config,
            }),
        }
    }

    /// Issue a trigger with no callbacks.
    ///
    /// See [`trigger_with`](Self::trigger_with).
    pub fn trigger(&self, params: P) -> TriggerOutcome {
        self.trigger_with(Trigger::new(params))
    }

    /// Issue a trigger, applying the store's concurrency policy.
    ///
    /// On acceptance the state is patched to the busy phase (clearing any
    /// previous error) before this method returns, so a caller observes
    /// `Loading`/`Saving` immediately. The operation then runs on a spawned
    /// Tokio task; its resolution patches the success or `Error` phase and
    /// runs the trigger's callback, unless it has been superseded by a later
    /// trigger or a reset, in which case the whole resolution is discarded.
    ///
    /// Under the exhaust policy the flight slot is released within the same
    /// state patch that settles the operation: once a settled state is
    /// observable (through [`settled`](Self::settled) or a selector), the
    /// next trigger is accepted.
    ///
    /// Never returns an error and never panics on operation failure: all
    /// rejections are classified into state.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime, since the operation is
    /// spawned onto the ambient runtime.
    #[tracing::instrument(skip_all, name = "store_trigger")]
    pub fn trigger_with(&self, trigger: Trigger<P, T, E>) -> TriggerOutcome {
        let inner = &self.inner;

        if matches!(inner.config.concurrency, ConcurrencyPolicy::Exhaust)
            && inner
                .in_flight
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
        {
            tracing::debug!("trigger dropped, operation already in flight");
            metrics::counter!(TRIGGERS_DROPPED).increment(1);
            return TriggerOutcome::DroppedBusy;
        }

        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::counter!(TRIGGERS, "policy" => policy_label(inner.config.concurrency))
            .increment(1);

        // The busy phase must be observable before trigger_with returns.
        let kind = inner.config.kind;
        inner.state_tx.send_modify(|state| state.begin(kind));
        tracing::debug!(generation, phase = %kind.busy_phase(), "operation started");

        let (params, on_success, on_error) = trigger.into_parts();
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            // Backstop: the flight slot is normally released inside the
            // settling send_modify below, but it must also be released if
            // the operation future unwinds.
            let _flight_guard = matches!(inner.config.concurrency, ConcurrencyPolicy::Exhaust)
                .then(|| InFlightGuard(Arc::clone(&inner.in_flight)));

            match run_attempts(&inner, params, generation).await {
                Ok(data) => {
                    let mut applied = false;
                    inner.state_tx.send_modify(|state| {
                        if inner.generation.load(Ordering::SeqCst) == generation {
                            state.complete(inner.config.kind, data.clone());
                            applied = true;
                        }
                        // The slot must be free by the time the settled
                        // state is observable, so a consumer reacting to
                        // settlement is never spuriously dropped.
                        inner.in_flight.store(false, Ordering::Release);
                    });
                    if applied {
                        tracing::debug!(generation, "operation succeeded");
                        metrics::counter!(COMPLETIONS, "outcome" => "success").increment(1);
                        if let Some(callback) = on_success {
                            callback(&data);
                        }
                    } else {
                        discard(generation);
                    }
                },
                Err(error) => {
                    let mut applied = false;
                    inner.state_tx.send_modify(|state| {
                        if inner.generation.load(Ordering::SeqCst) == generation {
                            state.fail(error.clone(), inner.config.on_failure);
                            applied = true;
                        }
                        inner.in_flight.store(false, Ordering::Release);
                    });
                    if applied {
                        tracing::debug!(generation, "operation failed, error classified");
                        metrics::counter!(COMPLETIONS, "outcome" => "error").increment(1);
                        if let Some(callback) = on_error {
                            callback(&error);
                        }
                    } else {
                        discard(generation);
                    }
                },
            }
        });

        TriggerOutcome::Started
    }

    /// Return the store to the canonical initial state.
    ///
    /// Idempotent: resetting an already idle store leaves it idle. A reset
    /// also supersedes any in-flight operation, so a stale completion can
    /// never move the store out of `Idle`. Under the exhaust policy the
    /// flight slot stays claimed until the superseded operation resolves;
    /// triggers issued before then are still dropped.
    pub fn reset(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.state_tx.send_modify(RequestState::reset);
        tracing::debug!("store reset");
        metrics::counter!(RESETS).increment(1);
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> RequestState<T, E> {
        self.inner.state_tx.borrow().clone()
    }

    /// Subscribe to state changes.
    ///
    /// Each patch is one notification; patches from different in-flight
    /// operations arrive in completion order.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T, E>> {
        self.inner.state_tx.subscribe()
    }

    /// Build a deduplicated selector over a projection of the state.
    pub fn select<U>(
        &self,
        project: impl Fn(&RequestState<T, E>) -> U + Send + Sync + 'static,
    ) -> Selector<T, E, U>
    where
        U: PartialEq + Clone,
    {
        Selector::new(self.subscribe(), project)
    }

    /// Check if a query is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state_tx.borrow().phase() == Phase::Loading
    }

    /// Check if a mutation is in flight.
    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.inner.state_tx.borrow().phase() == Phase::Saving
    }

    /// Check if any operation is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.inner.state_tx.borrow().is_busy()
    }

    /// Check if the last operation failed with the given classification.
    #[must_use]
    pub fn has_error(&self, kind: &E) -> bool
    where
        E: PartialEq,
    {
        self.inner.state_tx.borrow().error() == Some(kind)
    }

    /// Cloned copy of the last successful payload, if any.
    #[must_use]
    pub fn data(&self) -> Option<T> {
        self.inner.state_tx.borrow().data().cloned()
    }

    /// Cloned payload, or the type's default when none is loaded.
    #[must_use]
    pub fn data_or_default(&self) -> T
    where
        T: Default,
    {
        self.data().unwrap_or_default()
    }

    /// Wait until no operation is in flight and return the settled state.
    ///
    /// Resolves immediately when the store is already settled.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ChannelClosed`] if the store is dropped while
    /// waiting.
    pub async fn settled(&self) -> Result<RequestState<T, E>, StoreError> {
        let mut rx = self.subscribe();
        let state = rx
            .wait_for(|state| !state.is_busy())
            .await
            .map_err(|_| StoreError::ChannelClosed)?;
        Ok(state.clone())
    }

    /// Wait until the store settles, up to a deadline.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] when the deadline expires first, or
    /// [`StoreError::ChannelClosed`] if the store is dropped while waiting.
    pub async fn settled_within(
        &self,
        deadline: Duration,
    ) -> Result<RequestState<T, E>, StoreError> {
        tokio::time::timeout(deadline, self.settled())
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}

impl<P, T, E> Clone for RequestStore<P, T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, T, E> std::fmt::Debug for RequestStore<P, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestStore")
            .field("phase", &self.inner.state_tx.borrow().phase())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Run the operation, retrying classified failures per the store's retry
/// policy. A superseded generation stops retrying immediately.
async fn run_attempts<P, T, E>(inner: &Inner<P, T, E>, params: P, generation: u64) -> Result<T, E>
where
    P: Clone,
{
    let mut attempt: usize = 0;

    loop {
        let started = std::time::Instant::now();
        let result = (inner.run)(params.clone()).await;
        metrics::histogram!(OPERATION_DURATION).record(started.elapsed().as_secs_f64());

        match result {
            Ok(data) => return Ok(data),
            Err(error) => {
                let superseded = inner.generation.load(Ordering::SeqCst) != generation;
                if superseded || attempt >= inner.config.retry.max_retries() {
                    return Err(error);
                }

                let delay = inner.config.retry.delay_for_attempt(attempt);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis(),
                    "operation failed, retrying after delay"
                );
                metrics::counter!(RETRIES).increment(1);
                tokio::time::sleep(delay).await;
                attempt += 1;
            },
        }
    }
}

/// Record a discarded completion (superseded by a later trigger or reset).
fn discard(generation: u64) {
    tracing::debug!(generation, "completion discarded, superseded");
    metrics::counter!(SUPERSEDED).increment(1);
}

const fn policy_label(policy: ConcurrencyPolicy) -> &'static str {
    match policy {
        ConcurrencyPolicy::Switch => "switch",
        ConcurrencyPolicy::Exhaust => "exhaust",
    }
}

/// RAII guard releasing the exhaust-policy flight slot on drop.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
