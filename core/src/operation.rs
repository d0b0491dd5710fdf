//! The external operation contract.
//!
//! The store never constructs requests, parses responses, or manages
//! headers: the surrounding application supplies an [`Operation`] (typically
//! a thin wrapper over an HTTP or GraphQL client) and the store only awaits
//! its resolution. Timeouts belong to that external client.

use futures::future::BoxFuture;
use std::future::Future;

/// An asynchronous operation `(params) -> Result<Output, Failure>`.
///
/// Implement this for handles onto your data-access layer, or wrap a closure
/// with [`from_fn`]:
///
/// ```
/// use reqsync_core::operation::{Operation, from_fn};
///
/// let op = from_fn(|page: u32| async move {
///     Ok::<Vec<u32>, std::io::Error>(vec![page * 10, page * 10 + 1])
/// });
///
/// # tokio_test::block_on(async {
/// let rows = op.call(2).await.unwrap();
/// assert_eq!(rows, vec![20, 21]);
/// # });
/// ```
pub trait Operation<P>: Send + Sync {
    /// The successful payload type
    type Output: Send;

    /// The raw failure type, classified by the store at the boundary
    type Failure: Send;

    /// Start the operation for the given parameters.
    ///
    /// The returned future owns everything it needs; the store may drop its
    /// interest in the result at any time (logical cancellation) without
    /// aborting the future.
    fn call(&self, params: P) -> BoxFuture<'static, Result<Self::Output, Self::Failure>>;
}

/// An [`Operation`] built from a closure. Created by [`from_fn`].
#[derive(Debug, Clone)]
pub struct FnOperation<F> {
    f: F,
}

impl<P, F, Fut, T, Err> Operation<P> for FnOperation<F>
where
    F: Fn(P) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, Err>> + Send + 'static,
    T: Send,
    Err: Send,
{
    type Output = T;
    type Failure = Err;

    fn call(&self, params: P) -> BoxFuture<'static, Result<T, Err>> {
        Box::pin((self.f)(params))
    }
}

/// Wrap an async closure as an [`Operation`].
pub const fn from_fn<F>(f: F) -> FnOperation<F> {
    FnOperation { f }
}
