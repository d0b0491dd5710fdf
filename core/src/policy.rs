//! Per-instance store policies.
//!
//! Each request store chooses its concurrency discipline, what happens to
//! previously loaded data on failure, and which phases its operation moves
//! through. These are construction-time decisions, never global state.

use crate::phase::Phase;
use serde::{Deserialize, Serialize};

/// Concurrency discipline applied when a trigger arrives while an operation
/// is already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyPolicy {
    /// Latest wins: a new trigger supersedes the in-flight operation, whose
    /// eventual completion is discarded entirely (no state write, no
    /// callbacks). Used for read/search operations.
    Switch,

    /// A new trigger arriving while one is in flight is dropped without
    /// invoking the operation. Used for mutating operations such as
    /// upload/remove/invite.
    Exhaust,
}

/// What happens to previously loaded data when an operation fails.
///
/// Both conventions are legitimate: search/list stores usually clear their
/// data on failure, list-then-filter stores keep stale data visible. The
/// choice is explicit per store instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Clear `data` when entering the `Error` phase (search/list stores)
    ClearData,

    /// Keep the last successful `data` across the failure (list-then-filter
    /// stores rendering stale results alongside the error)
    RetainData,
}

/// Whether the tracked operation reads or mutates, which decides the busy
/// and success phases it moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// A read operation: `Loading` while in flight, `Loaded` on success
    Query,

    /// A mutating operation: `Saving` while in flight, `Saved` on success
    Mutation,
}

impl OperationKind {
    /// The phase entered while the operation is in flight
    #[must_use]
    pub const fn busy_phase(self) -> Phase {
        match self {
            Self::Query => Phase::Loading,
            Self::Mutation => Phase::Saving,
        }
    }

    /// The phase entered when the operation succeeds
    #[must_use]
    pub const fn success_phase(self) -> Phase {
        match self {
            Self::Query => Phase::Loaded,
            Self::Mutation => Phase::Saved,
        }
    }

    /// The concurrency policy this kind uses unless overridden.
    ///
    /// Queries take the latest trigger; mutations drop triggers while busy
    /// so a double-click cannot start a second upload.
    #[must_use]
    pub const fn default_concurrency(self) -> ConcurrencyPolicy {
        match self {
            Self::Query => ConcurrencyPolicy::Switch,
            Self::Mutation => ConcurrencyPolicy::Exhaust,
        }
    }
}
