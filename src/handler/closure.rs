//! Handler trait and the closure wrapper.
//!
//! A [`Handler`] receives the positional arguments of one call (with the
//! completion callback removed) and returns a boxed future. Closures are
//! turned into handlers with [`FnHandler`], which also boxes the closure's
//! error type.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use super::Proceed;
use crate::args::Args;
use crate::error::BoxError;

/// Result type for handler functions.
pub type HandlerResult<R> = std::result::Result<R, BoxError>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for adapted handlers.
pub trait Handler<T>: Send + Sync + 'static {
    /// Value the handler resolves with on success.
    type Output: Proceed + Send + 'static;

    /// Run the handler with the given arguments.
    fn call(&self, args: Args<T>) -> BoxFuture<'static, HandlerResult<Self::Output>>;
}

/// Wrapper that turns an async closure into a [`Handler`].
pub struct FnHandler<F, T, Fut, R, E>
where
    F: Fn(Args<T>) -> Fut + Send + Sync + 'static,
    T: Send + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Proceed + Send + 'static,
    E: Into<BoxError> + 'static,
{
    handler: F,
    _phantom: PhantomData<fn(T) -> (Fut, R, E)>,
}

impl<F, T, Fut, R, E> FnHandler<F, T, Fut, R, E>
where
    F: Fn(Args<T>) -> Fut + Send + Sync + 'static,
    T: Send + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Proceed + Send + 'static,
    E: Into<BoxError> + 'static,
{
    /// Create a new closure handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, T, Fut, R, E> Handler<T> for FnHandler<F, T, Fut, R, E>
where
    F: Fn(Args<T>) -> Fut + Send + Sync + 'static,
    T: Send + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Proceed + Send + 'static,
    E: Into<BoxError> + 'static,
{
    type Output = R;

    fn call(&self, args: Args<T>) -> BoxFuture<'static, HandlerResult<R>> {
        let fut = (self.handler)(args);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}
