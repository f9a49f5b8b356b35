//! Deferred values: boxed futures tied to an invocation's lifetime.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::DeferredError;

/// A value that completes asynchronously.
///
/// `Deferred` is both a parameter wrapper (the handler receives a future of
/// the inner value) and a return type (the response is produced later). It
/// can be attached to a [`CancellationToken`] so that cancelling the owning
/// invocation stops the wait.
pub struct Deferred<T> {
    inner: BoxFuture<'static, Result<T, DeferredError>>,
}

impl<T: Send + 'static> Deferred<T> {
    /// Wraps an infallible future.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            inner: Box::pin(async move { Ok(future.await) }),
        }
    }

    /// Wraps a fallible future. Errors are kept as text.
    pub fn try_new<F, E>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        E: fmt::Display,
    {
        Self {
            inner: Box::pin(async move {
                future
                    .await
                    .map_err(|e| DeferredError::Failed(e.to_string()))
            }),
        }
    }

    /// Wraps a future that reports its own [`DeferredError`].
    pub(crate) fn from_result<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, DeferredError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(future),
        }
    }

    /// Creates an already completed value.
    pub fn ready(value: T) -> Self {
        Self {
            inner: Box::pin(futures::future::ready(Ok(value))),
        }
    }

    /// Maps the value once it completes.
    pub fn map<U, F>(self, f: F) -> Deferred<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let inner = self.inner;
        Deferred {
            inner: Box::pin(async move { inner.await.map(f) }),
        }
    }

    /// Maps the value with a fallible function once it completes.
    pub fn try_map<U, F>(self, f: F) -> Deferred<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Result<U, DeferredError> + Send + 'static,
    {
        let inner = self.inner;
        Deferred {
            inner: Box::pin(async move { inner.await.and_then(f) }),
        }
    }

    /// Stops waiting with [`DeferredError::Cancelled`] once `token` fires.
    pub fn with_cancellation(self, token: CancellationToken) -> Self {
        let inner = self.inner;
        Self {
            inner: Box::pin(async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(DeferredError::Cancelled),
                    result = inner => result,
                }
            }),
        }
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, DeferredError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.get_mut().inner.as_mut().poll(cx)
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}
