//! The request state container.

use crate::classify::ErrorKind;
use crate::phase::Phase;
use crate::policy::{FailurePolicy, OperationKind};
use serde::{Deserialize, Serialize};

/// The state tracked for one asynchronous request.
///
/// Holds the current [`Phase`], the last successful payload, and the last
/// classified failure. Fields are private so every reachable value upholds
/// the invariants:
///
/// - `phase == Error` if and only if the error is present
/// - a success or busy phase implies no error is present
///
/// Transitions go through [`begin`](Self::begin), [`complete`](Self::complete),
/// [`fail`](Self::fail), and [`reset`](Self::reset); each preserves the
/// invariants by construction.
///
/// # Type Parameters
///
/// - `T`: the successful payload type
/// - `E`: the classified error type (defaults to [`ErrorKind`])
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestState<T, E = ErrorKind> {
    phase: Phase,
    data: Option<T>,
    error: Option<E>,
}

impl<T, E> RequestState<T, E> {
    /// The canonical initial state: `Idle` with no data and no error.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            data: None,
            error: None,
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Last successful payload, if any
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Classified error of the last failed operation, if any
    #[must_use]
    pub const fn error(&self) -> Option<&E> {
        self.error.as_ref()
    }

    /// Check if an operation is in flight
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    /// Enter the busy phase for the given operation kind.
    ///
    /// Clears any previous error. Previously loaded data is retained while
    /// the operation runs, so consumers can keep rendering stale data during
    /// a refresh.
    pub fn begin(&mut self, kind: OperationKind) {
        self.phase = kind.busy_phase();
        self.error = None;
    }

    /// Enter the success phase for the given operation kind with a payload.
    pub fn complete(&mut self, kind: OperationKind, data: T) {
        self.phase = kind.success_phase();
        self.data = Some(data);
        self.error = None;
    }

    /// Enter the `Error` phase with a classified failure.
    ///
    /// Whether previously loaded data survives the failure is a per-store
    /// policy choice, passed in by the coordinator.
    pub fn fail(&mut self, error: E, policy: FailurePolicy) {
        self.phase = Phase::Error;
        self.error = Some(error);
        if matches!(policy, FailurePolicy::ClearData) {
            self.data = None;
        }
    }

    /// Return to the canonical initial state.
    pub fn reset(&mut self) {
        *self = Self::idle();
    }
}

impl<T, E> Default for RequestState<T, E> {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invariants_hold<T, E>(state: &RequestState<T, E>) -> bool {
        let error_iff_error_phase = (state.phase() == Phase::Error) == state.error().is_some();
        let success_has_no_error = !state.phase().is_success() || state.error().is_none();
        let busy_has_no_error = !state.phase().is_busy() || state.error().is_none();
        error_iff_error_phase && success_has_no_error && busy_has_no_error
    }

    #[test]
    fn initial_state() {
        let state: RequestState<Vec<u64>> = RequestState::idle();
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.data(), None);
        assert!(state.error().is_none());
        assert!(invariants_hold(&state));
    }

    #[test]
    fn default_is_idle() {
        let state: RequestState<u32> = RequestState::default();
        assert_eq!(state, RequestState::idle());
    }

    #[test]
    fn query_lifecycle() {
        let mut state: RequestState<Vec<u64>> = RequestState::idle();

        state.begin(OperationKind::Query);
        assert_eq!(state.phase(), Phase::Loading);
        assert!(invariants_hold(&state));

        state.complete(OperationKind::Query, vec![1, 2]);
        assert_eq!(state.phase(), Phase::Loaded);
        assert_eq!(state.data(), Some(&vec![1, 2]));
        assert!(invariants_hold(&state));
    }

    #[test]
    fn mutation_lifecycle() {
        let mut state: RequestState<String> = RequestState::idle();

        state.begin(OperationKind::Mutation);
        assert_eq!(state.phase(), Phase::Saving);

        state.complete(OperationKind::Mutation, "done".into());
        assert_eq!(state.phase(), Phase::Saved);
        assert!(invariants_hold(&state));
    }

    #[test]
    fn begin_clears_error_and_keeps_data() {
        let mut state: RequestState<u32> = RequestState::idle();
        state.complete(OperationKind::Query, 7);
        state.fail(ErrorKind::General, FailurePolicy::RetainData);
        assert_eq!(state.data(), Some(&7));

        state.begin(OperationKind::Query);
        assert!(state.error().is_none());
        assert_eq!(state.data(), Some(&7));
        assert!(invariants_hold(&state));
    }

    #[test]
    fn failure_clears_data_under_clear_policy() {
        let mut state: RequestState<u32> = RequestState::idle();
        state.complete(OperationKind::Query, 7);

        state.fail(ErrorKind::NotFound, FailurePolicy::ClearData);
        assert_eq!(state.phase(), Phase::Error);
        assert_eq!(state.error(), Some(&ErrorKind::NotFound));
        assert_eq!(state.data(), None);
        assert!(invariants_hold(&state));
    }

    #[test]
    fn failure_retains_data_under_retain_policy() {
        let mut state: RequestState<u32> = RequestState::idle();
        state.complete(OperationKind::Query, 7);

        state.fail(ErrorKind::General, FailurePolicy::RetainData);
        assert_eq!(state.phase(), Phase::Error);
        assert_eq!(state.data(), Some(&7));
        assert!(invariants_hold(&state));
    }

    #[test]
    fn reset_from_any_phase() {
        let mut state: RequestState<u32> = RequestState::idle();
        state.complete(OperationKind::Query, 7);
        state.reset();
        assert_eq!(state, RequestState::idle());

        state.fail(ErrorKind::General, FailurePolicy::ClearData);
        state.reset();
        assert_eq!(state, RequestState::idle());

        // Resetting an already idle state is a no-op
        state.reset();
        assert_eq!(state, RequestState::idle());
    }
}
