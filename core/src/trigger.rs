//! Trigger descriptions and outcomes.

/// A request to start the asynchronous operation tracked by a store.
///
/// Carries the operation parameters plus optional completion callbacks.
/// Triggers are ephemeral: the coordinator consumes them and nothing is
/// retained after the operation completes. Callbacks run only when the
/// completion is actually applied; a completion superseded under the switch
/// policy is discarded together with its callbacks.
///
/// # Example
///
/// ```ignore
/// store.trigger_with(
///     Trigger::new(InviteParams { email })
///         .on_success(|_| toast.show("invitation sent"))
///         .on_error(|kind| toast.show_error(kind)),
/// );
/// ```
pub struct Trigger<P, T, E> {
    params: P,
    on_success: Option<Box<dyn FnOnce(&T) + Send>>,
    on_error: Option<Box<dyn FnOnce(&E) + Send>>,
}

impl<P, T, E> Trigger<P, T, E> {
    /// Create a trigger with no callbacks.
    #[must_use]
    pub const fn new(params: P) -> Self {
        Self {
            params,
            on_success: None,
            on_error: None,
        }
    }

    /// Attach a callback invoked with the payload when the operation
    /// succeeds and its completion is applied.
    #[must_use]
    pub fn on_success(mut self, f: impl FnOnce(&T) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Attach a callback invoked with the classified error when the
    /// operation fails and its completion is applied.
    #[must_use]
    pub fn on_error(mut self, f: impl FnOnce(&E) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// The operation parameters.
    #[must_use]
    pub const fn params(&self) -> &P {
        &self.params
    }

    /// Decompose into parameters and callbacks for the coordinator.
    #[must_use]
    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> (
        P,
        Option<Box<dyn FnOnce(&T) + Send>>,
        Option<Box<dyn FnOnce(&E) + Send>>,
    ) {
        (self.params, self.on_success, self.on_error)
    }
}

impl<P: std::fmt::Debug, T, E> std::fmt::Debug for Trigger<P, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trigger")
            .field("params", &self.params)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// What the concurrency policy decided about a trigger.
///
/// Triggering is infallible by design; the only non-start outcome is the
/// exhaust policy dropping a trigger while an operation is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The operation was started (or, under the switch policy, restarted)
    Started,

    /// The trigger was dropped because an operation is already in flight
    /// under the exhaust policy; the operation was not invoked
    DroppedBusy,
}

impl TriggerOutcome {
    /// Check if the trigger started an operation
    #[must_use]
    pub const fn is_started(self) -> bool {
        matches!(self, Self::Started)
    }

    /// Check if the trigger was dropped while busy
    #[must_use]
    pub const fn is_dropped(self) -> bool {
        matches!(self, Self::DroppedBusy)
    }
}
