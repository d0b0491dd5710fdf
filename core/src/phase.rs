//! Request lifecycle phases.

use serde::{Deserialize, Serialize};

/// The discrete state of a request lifecycle.
///
/// Every request store starts `Idle`, enters a busy phase (`Loading` for
/// queries, `Saving` for mutations) when triggered, and settles in a success
/// phase (`Loaded`/`Saved`) or `Error`. `reset` returns it to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No request has been issued since creation or the last reset
    Idle,

    /// A query operation is in flight
    Loading,

    /// A mutating operation is in flight
    Saving,

    /// The last query completed successfully
    Loaded,

    /// The last mutation completed successfully
    Saved,

    /// The last operation failed; the classified error is held in state
    Error,
}

impl Phase {
    /// Check if an operation is currently in flight
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Loading | Self::Saving)
    }

    /// Check if the phase is settled (no operation in flight)
    #[must_use]
    pub const fn is_settled(self) -> bool {
        !self.is_busy()
    }

    /// Check if the phase is the initial one
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Check if the last operation completed successfully
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Loaded | Self::Saved)
    }

    /// Check if the last operation failed
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Saving => write!(f, "saving"),
            Self::Loaded => write!(f, "loaded"),
            Self::Saved => write!(f, "saved"),
            Self::Error => write!(f, "error"),
        }
    }
}
