//! Derived, read-only views over store state.
//!
//! A selector is a pure projection of [`RequestState`], recomputed on every
//! state change and deduplicated: `changed()` resolves only when the
//! projected value actually differs from the last one observed through this
//! selector. Selectors are cheap and independent; share them freely across
//! consumers while the store itself stays exclusively owned.

use crate::StoreError;
use reqsync_core::state::RequestState;
use tokio::sync::watch;

/// A deduplicated projection of a store's state.
///
/// Created with `RequestStore::select`:
///
/// ```ignore
/// let mut phases = store.select(|state| state.phase());
/// assert_eq!(phases.changed().await?, Phase::Idle);   // current value first
/// store.trigger(params);
/// assert_eq!(phases.changed().await?, Phase::Loading);
/// ```
pub struct Selector<T, E, U> {
    rx: watch::Receiver<RequestState<T, E>>,
    project: Box<dyn Fn(&RequestState<T, E>) -> U + Send + Sync>,
    last: Option<U>,
}

impl<T, E, U> Selector<T, E, U>
where
    U: PartialEq + Clone,
{
    pub(crate) fn new(
        rx: watch::Receiver<RequestState<T, E>>,
        project: impl Fn(&RequestState<T, E>) -> U + Send + Sync + 'static,
    ) -> Self {
        Self {
            rx,
            project: Box::new(project),
            last: None,
        }
    }

    /// Recompute the projection against the current state.
    #[must_use]
    pub fn current(&self) -> U {
        (self.project)(&self.rx.borrow())
    }

    /// Wait for the next distinct projected value.
    ///
    /// The first call resolves immediately with the current projection;
    /// subsequent calls resolve only when a state change produces a value
    /// different from the last one returned. State changes that leave the
    /// projection unchanged are skipped silently.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ChannelClosed`] once the owning store has been
    /// dropped and no further distinct value can arrive.
    pub async fn changed(&mut self) -> Result<U, StoreError> {
        loop {
            let next = {
                let state = self.rx.borrow_and_update();
                (self.project)(&state)
            };

            if self.last.as_ref() != Some(&next) {
                self.last = Some(next.clone());
                return Ok(next);
            }

            self.rx
                .changed()
                .await
                .map_err(|_| StoreError::ChannelClosed)?;
        }
    }
}

impl<T, E, U> std::fmt::Debug for Selector<T, E, U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::store::RequestStore;
    use reqsync_core::classify::StatusCoded;
    use reqsync_core::operation::from_fn;
    use reqsync_core::phase::Phase;
    use std::time::Duration;

    #[derive(Debug, Clone)]
    struct Failure;

    impl StatusCoded for Failure {
        fn status(&self) -> Option<u16> {
            None
        }
    }

    fn slow_query() -> RequestStore<u32, u32> {
        RequestStore::query(from_fn(|n: u32| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<u32, Failure>(n)
        }))
    }

    #[tokio::test]
    async fn first_changed_yields_current_value() {
        let store = slow_query();
        let mut phases = store.select(|state| state.phase());
        assert_eq!(phases.changed().await.unwrap(), Phase::Idle);
    }

    #[tokio::test]
    async fn changed_follows_the_lifecycle() {
        let store = slow_query();
        let mut phases = store.select(|state| state.phase());
        assert_eq!(phases.changed().await.unwrap(), Phase::Idle);

        store.trigger(1);
        assert_eq!(phases.changed().await.unwrap(), Phase::Loading);
        assert_eq!(phases.changed().await.unwrap(), Phase::Loaded);
    }

    #[tokio::test]
    async fn unchanged_projections_are_skipped() {
        let store = slow_query();
        let mut constant = store.select(|_| 0u8);
        assert_eq!(constant.changed().await.unwrap(), 0);

        // State changes, but the projection does not: changed() must not
        // resolve.
        store.trigger(1);
        let outcome =
            tokio::time::timeout(Duration::from_millis(100), constant.changed()).await;
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn current_recomputes_eagerly() {
        let store = slow_query();
        let loading = store.select(|state| state.phase().is_busy());
        assert!(!loading.current());
        store.trigger(1);
        assert!(loading.current());
    }

    #[tokio::test]
    async fn closed_channel_surfaces_as_error() {
        let store = slow_query();
        let mut phases = store.select(|state| state.phase());
        assert_eq!(phases.changed().await.unwrap(), Phase::Idle);

        drop(store);
        assert_eq!(
            phases.changed().await,
            Err(crate::StoreError::ChannelClosed)
        );
    }
}
