//! Concurrency-policy behavior: switch latest-wins and exhaust drop.

#![allow(clippy::unwrap_used)]

use reqsync_core::operation::from_fn;
use reqsync_core::phase::Phase;
use reqsync_core::state::RequestState;
use reqsync_core::trigger::Trigger;
use reqsync_runtime::RequestStore;
use reqsync_testing::{ScriptedOp, StatusFailure, settle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

/// A query whose parameters are `(delay_ms, value)`.
fn delayed_echo() -> RequestStore<(u64, u32), u32> {
    RequestStore::query(from_fn(|(delay_ms, value): (u64, u32)| async move {
        sleep(Duration::from_millis(delay_ms)).await;
        Ok::<u32, StatusFailure>(value)
    }))
}

#[tokio::test]
async fn switch_policy_latest_trigger_wins() {
    let store = delayed_echo();

    // Slow A, then fast B before A resolves
    assert!(store.trigger((100, 1)).is_started());
    assert!(store.trigger((10, 2)).is_started());

    let state = settle(&store).await.unwrap();
    assert_eq!(state.phase(), Phase::Loaded);
    assert_eq!(state.data(), Some(&2));

    // A's late completion must be discarded, not applied out of order
    sleep(Duration::from_millis(150)).await;
    assert_eq!(store.data(), Some(2));
    assert_eq!(store.state().phase(), Phase::Loaded);
}

#[tokio::test]
async fn switch_policy_applies_only_the_latest_of_many() {
    let store = delayed_echo();

    for (index, delay_ms) in [50u64, 40, 30, 20, 10].into_iter().enumerate() {
        assert!(store.trigger((delay_ms, u32::try_from(index).unwrap())).is_started());
    }

    sleep(Duration::from_millis(120)).await;
    assert_eq!(store.data(), Some(4));
}

#[tokio::test]
async fn switch_policy_discards_superseded_callbacks() {
    let store = delayed_echo();
    let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));

    for (delay_ms, value) in [(100u64, 1u32), (10, 2)] {
        let sink = Arc::clone(&seen);
        store.trigger_with(
            Trigger::new((delay_ms, value)).on_success(move |result: &u32| {
                sink.lock().unwrap().push(*result);
            }),
        );
    }

    sleep(Duration::from_millis(200)).await;
    // Only the surviving trigger's callback ran
    assert_eq!(*seen.lock().unwrap(), vec![2]);
}

#[tokio::test]
async fn exhaust_policy_drops_triggers_while_busy() {
    let op = ScriptedOp::new().then_ok_after(Duration::from_millis(50), "saved".to_string());
    let probe = op.clone();
    let store = RequestStore::mutation(op);

    assert!(store.trigger(()).is_started());
    assert!(store.trigger(()).is_dropped());
    assert!(store.trigger(()).is_dropped());

    let state = settle(&store).await.unwrap();
    assert_eq!(state.phase(), Phase::Saved);
    assert_eq!(state.data(), Some(&"saved".to_string()));

    // The dropped triggers never invoked the operation
    assert_eq!(probe.calls(), 1);
}

#[tokio::test]
async fn exhaust_policy_accepts_again_after_settlement() {
    let op = ScriptedOp::new().then_ok(1u32).then_ok(2);
    let probe = op.clone();
    let store = RequestStore::mutation(op);

    assert!(store.trigger(()).is_started());
    let _ = settle(&store).await.unwrap();

    assert!(store.trigger(()).is_started());
    let state = settle(&store).await.unwrap();

    assert_eq!(state.data(), Some(&2));
    assert_eq!(probe.calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn exhaust_slot_is_free_once_settled_state_is_observable() {
    // The flight slot is released within the state patch that settles the
    // operation, so a consumer reacting to settlement can re-trigger
    // without being spuriously dropped by a slot that is still claimed.
    let mut op = ScriptedOp::new();
    for n in 0..20u32 {
        op = op.then_ok(n);
    }
    let probe = op.clone();
    let store = RequestStore::mutation(op);

    for _ in 0..20 {
        assert!(store.trigger(()).is_started());
        let state = settle(&store).await.unwrap();
        assert_eq!(state.phase(), Phase::Saved);
    }
    assert_eq!(probe.calls(), 20);
}

#[tokio::test]
async fn reset_supersedes_in_flight_operation() {
    let store = delayed_echo();

    assert!(store.trigger((50, 9)).is_started());
    store.reset();
    assert_eq!(store.state(), RequestState::idle());

    // The superseded completion must not resurrect the store
    sleep(Duration::from_millis(100)).await;
    assert_eq!(store.state(), RequestState::idle());
}

#[tokio::test]
async fn switch_policy_discards_superseded_failures_too() {
    // Slow failure superseded by a fast success: the error must never
    // become observable.
    let op = ScriptedOp::new()
        .then_err_after(Duration::from_millis(80), 500)
        .then_ok_after(Duration::from_millis(10), 7u32);
    let store = RequestStore::query(op);

    assert!(store.trigger(()).is_started());
    assert!(store.trigger(()).is_started());

    sleep(Duration::from_millis(150)).await;
    let state = store.state();
    assert_eq!(state.phase(), Phase::Loaded);
    assert_eq!(state.data(), Some(&7));
    assert!(state.error().is_none());
}
