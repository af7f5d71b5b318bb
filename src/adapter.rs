//! Handler adapter and run lifecycle.
//!
//! [`wrap`] turns an async handler into an [`Adapted`] stage that the
//! pipeline calls with its positional arguments. Each call:
//! 1. Removes the completion callback at `Options::next_index`
//! 2. Spawns the handler with the remaining arguments
//! 3. On success, calls `next.proceed()` unless the stage is terminal or the
//!    handler returned `false`
//! 4. On failure, calls `next.fail(err)`
//!
//! # Example
//!
//! ```ignore
//! use co_next::{wrap, Arg, Args, BoxError, Options};
//!
//! #[tokio::main]
//! async fn main() {
//!     let stage = wrap(
//!         |args: Args<String>| async move {
//!             let user = fetch_user(args.value(0)).await?;
//!             Ok::<_, BoxError>(user.is_some())
//!         },
//!         Options::default(),
//!     );
//!
//!     stage.call(vec![
//!         Arg::value(req),
//!         Arg::value(res),
//!         Arg::next(|err| Ok(())),
//!     ]);
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::args::{take_at, Arg, Args};
use crate::error::{join_message, share, BoxError, HandlerError, HandlerPanic, Result, RunError};
use crate::handler::{BoxFuture, FnHandler, Handler, HandlerResult, Proceed};
use crate::next::Next;
use crate::options::Options;

/// Adapt an async handler into a pipeline stage.
///
/// The handler receives every positional argument except the completion
/// callback. Nothing runs until [`Adapted::call`].
pub fn wrap<F, T, Fut, R, E>(handler: F, options: Options) -> Adapted<FnHandler<F, T, Fut, R, E>, T>
where
    F: Fn(Args<T>) -> Fut + Send + Sync + 'static,
    T: Send + 'static,
    Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
    R: Proceed + Send + 'static,
    E: Into<BoxError> + 'static,
{
    Adapted::new(FnHandler::new(handler), options)
}

/// Like [`wrap`], but never calls the completion callback after success.
///
/// `terminal` is forced on whatever the given options say.
pub fn wrap_terminal<F, T, Fut, R, E>(
    handler: F,
    options: Options,
) -> Adapted<FnHandler<F, T, Fut, R, E>, T>
where
    F: Fn(Args<T>) -> Fut + Send + Sync + 'static,
    T: Send + 'static,
    Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
    R: Proceed + Send + 'static,
    E: Into<BoxError> + 'static,
{
    wrap(handler, options.terminal(true))
}

/// [`wrap`] for route parameter handlers.
///
/// Parameter handlers take `(req, res, next, value, name)`, so the callback
/// sits at the same default index as for regular handlers.
pub fn wrap_param<F, T, Fut, R, E>(
    handler: F,
    options: Options,
) -> Adapted<FnHandler<F, T, Fut, R, E>, T>
where
    F: Fn(Args<T>) -> Fut + Send + Sync + 'static,
    T: Send + 'static,
    Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
    R: Proceed + Send + 'static,
    E: Into<BoxError> + 'static,
{
    wrap(handler, options)
}

/// A handler adapted to the completion-callback convention.
///
/// Cheap to clone; clones share the handler. Calls are independent runs.
pub struct Adapted<H, T> {
    handler: Arc<H>,
    options: Options,
    _phantom: PhantomData<fn(T)>,
}

impl<H, T> Adapted<H, T>
where
    H: Handler<T>,
    T: Send + 'static,
{
    /// Adapt any [`Handler`] implementation.
    pub fn new(handler: H, options: Options) -> Self {
        Self {
            handler: Arc::new(handler),
            options,
            _phantom: PhantomData,
        }
    }

    /// Options this stage was adapted with.
    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Invoke the stage with the pipeline's positional arguments.
    ///
    /// Returns the run handle when `return_handle` is set, `None` otherwise.
    /// In the latter case the run continues in the background and a failure
    /// of the completion callback is logged as unhandled.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn call(&self, mut args: Vec<Arg<T>>) -> Option<RunHandle<H::Output>> {
        let len = args.len();
        let index = self.options.resolve_index(len);
        let slot = take_at(&mut args, index);
        let next = callback(slot, self.options.next_index, len);

        tracing::debug!(
            "Starting run: next_index={}, args={}, terminal={}",
            self.options.next_index,
            len,
            self.options.terminal
        );

        let fut = self.handler.call(Args::new(args));
        let run = drive(fut, next, self.options.terminal);

        if self.options.return_handle {
            return Some(RunHandle::spawn(run));
        }

        tokio::spawn(async move {
            if let Err(e) = run.await {
                tracing::error!("Unhandled failure in adapted handler: {}", e);
            }
        });
        None
    }
}

impl<H, T> Clone for Adapted<H, T> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            options: self.options,
            _phantom: PhantomData,
        }
    }
}

impl<H, T> fmt::Debug for Adapted<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapted")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Resolve the removed slot into a callable `Next`.
///
/// The error is only surfaced if the run actually needs to call it.
fn callback<T>(slot: Option<Arg<T>>, index: isize, len: usize) -> Result<Next> {
    match slot {
        Some(Arg::Next(next)) => Ok(next),
        Some(Arg::Value(_)) => Err(RunError::NotCallable { index }),
        None => Err(RunError::MissingNext { index, len }),
    }
}

/// Run the handler to completion, then signal the completion callback.
///
/// The handler runs in its own task so that a panic in it is caught and
/// forwarded like any other handler failure.
async fn drive<R: Proceed + Send + 'static>(
    fut: BoxFuture<'static, HandlerResult<R>>,
    next: Result<Next>,
    terminal: bool,
) -> Result<Completion<R>> {
    let outcome = match tokio::spawn(fut).await {
        Ok(outcome) => outcome,
        Err(e) => Err(Box::new(HandlerPanic {
            message: join_message(e),
        }) as BoxError),
    };

    match outcome {
        Ok(value) => {
            if terminal {
                tracing::trace!("Terminal stage, not calling next");
            } else if !value.proceeds() {
                tracing::trace!("Handler returned false, not calling next");
            } else {
                next?.proceed().map_err(RunError::Next)?;
            }
            Ok(Completion::Returned(value))
        }
        Err(e) => {
            let err = share(e);
            tracing::debug!("Handler failed, forwarding to next: {}", err);
            next?.fail(err.clone()).map_err(RunError::Next)?;
            Ok(Completion::Forwarded(err))
        }
    }
}

/// How a run ended, when the completion callback did not fail.
#[derive(Debug)]
pub enum Completion<R> {
    /// The handler returned this value.
    Returned(R),
    /// The handler failed and the error was passed to the completion callback.
    Forwarded(HandlerError),
}

impl<R> Completion<R> {
    /// The handler's return value, if it succeeded.
    pub fn returned(self) -> Option<R> {
        match self {
            Completion::Returned(value) => Some(value),
            Completion::Forwarded(_) => None,
        }
    }

    /// The forwarded handler error, if it failed.
    pub fn forwarded(&self) -> Option<&HandlerError> {
        match self {
            Completion::Returned(_) => None,
            Completion::Forwarded(err) => Some(err),
        }
    }

    /// Returns true if the handler failed.
    pub fn is_forwarded(&self) -> bool {
        matches!(self, Completion::Forwarded(_))
    }
}

/// Handle to one run of an [`Adapted`] stage.
///
/// Resolves once the handler has finished and the completion callback (if
/// any) has returned. Dropping the handle detaches the run; it is not
/// cancelled.
pub struct RunHandle<R> {
    task: JoinHandle<Result<Completion<R>>>,
}

impl<R: Send + 'static> RunHandle<R> {
    fn spawn<F>(run: F) -> Self
    where
        F: Future<Output = Result<Completion<R>>> + Send + 'static,
    {
        Self {
            task: tokio::spawn(run),
        }
    }
}

impl<R> RunHandle<R> {
    /// Returns true if the run has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<R> Future for RunHandle<R> {
    type Output = Result<Completion<R>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.task).poll(cx).map(|joined| match joined {
            Ok(outcome) => outcome,
            Err(e) => Err(RunError::Panicked(join_message(e))),
        })
    }
}

impl<R> fmt::Debug for RunHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunHandle")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_next() -> (Arg<&'static str>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let next = Arg::next(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (next, count)
    }

    #[test]
    fn test_callback_resolution() {
        assert!(callback::<()>(Some(Arg::next(|_| Ok(()))), 2, 3).is_ok());
        assert!(matches!(
            callback(Some(Arg::value(())), 1, 3),
            Err(RunError::NotCallable { index: 1 })
        ));
        assert!(matches!(
            callback::<()>(None, 2, 2),
            Err(RunError::MissingNext { index: 2, len: 2 })
        ));
    }

    #[tokio::test]
    async fn test_adapted_is_reusable() {
        let stage = wrap(
            |_: Args<&'static str>| async { Ok::<_, BoxError>(()) },
            Options::default().return_handle(true),
        );
        let (next, count) = counting_next();

        for _ in 0..3 {
            stage
                .clone()
                .call(vec![Arg::value("req"), Arg::value("res"), next.clone()])
                .unwrap()
                .await
                .unwrap();
        }

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_terminal_without_callback_succeeds() {
        let stage = wrap_terminal(
            |_: Args<&'static str>| async { Ok::<_, BoxError>(()) },
            Options::default().return_handle(true),
        );

        let outcome = stage.call(vec![Arg::value("req")]).unwrap().await;
        assert!(matches!(outcome, Ok(Completion::Returned(()))));
    }

    #[tokio::test]
    async fn test_missing_callback_fails_run() {
        let stage = wrap(
            |_: Args<&'static str>| async { Ok::<_, BoxError>(()) },
            Options::default().return_handle(true),
        );

        let outcome = stage
            .call(vec![Arg::value("req"), Arg::value("res")])
            .unwrap()
            .await;
        assert!(matches!(
            outcome,
            Err(RunError::MissingNext { index: 2, len: 2 })
        ));
    }

    #[tokio::test]
    async fn test_value_at_callback_index_fails_run() {
        let stage = wrap(
            |_: Args<&'static str>| async { Err::<(), _>("boom") },
            Options::default().return_handle(true),
        );

        let outcome = stage
            .call(vec![Arg::value("req"), Arg::value("res"), Arg::value("oops")])
            .unwrap()
            .await;
        assert!(matches!(outcome, Err(RunError::NotCallable { index: 2 })));
    }

    #[tokio::test]
    async fn test_handler_panic_forwarded_to_next() {
        let stage = wrap(
            |_: Args<&'static str>| async {
                if true {
                    panic!("handler exploded");
                }
                Ok::<_, BoxError>(())
            },
            Options::default().return_handle(true),
        );
        let (next, count) = counting_next();

        let outcome = stage
            .call(vec![Arg::value("req"), Arg::value("res"), next])
            .unwrap()
            .await
            .unwrap();

        let err = outcome.forwarded().unwrap();
        let panic = err.downcast_ref::<HandlerPanic>().unwrap();
        assert_eq!(panic.message, "handler exploded");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_callback_panic_is_reported() {
        let stage = wrap(
            |_: Args<&'static str>| async { Ok::<_, BoxError>(()) },
            Options::default().return_handle(true),
        );
        let next = Arg::next(|_| panic!("callback exploded"));

        let outcome = stage
            .call(vec![Arg::value("req"), Arg::value("res"), next])
            .unwrap()
            .await;
        match outcome {
            Err(RunError::Panicked(message)) => assert_eq!(message, "callback exploded"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_wrap_does_not_run_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let stage = wrap(
            move |_: Args<()>| {
                seen.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, BoxError>(()) }
            },
            Options::default(),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(stage.options(), &Options::default());
    }

    #[test]
    fn test_wrap_terminal_forces_terminal() {
        let stage = wrap_terminal(
            |_: Args<()>| async { Ok::<_, BoxError>(()) },
            Options::default().terminal(false).next_index(1),
        );
        assert!(stage.options().terminal);
        assert_eq!(stage.options().next_index, 1);
    }

    #[test]
    fn test_wrap_param_keeps_defaults() {
        let stage = wrap_param(|_: Args<()>| async { Ok::<_, BoxError>(()) }, Options::default());
        assert_eq!(stage.options(), &Options::default());
    }

    #[test]
    fn test_completion_accessors() {
        let ok: Completion<u8> = Completion::Returned(7);
        assert!(!ok.is_forwarded());
        assert!(ok.forwarded().is_none());
        assert_eq!(ok.returned(), Some(7));

        let err: HandlerError = share("nope".into());
        let failed: Completion<u8> = Completion::Forwarded(err);
        assert!(failed.is_forwarded());
        assert_eq!(failed.forwarded().unwrap().to_string(), "nope");
        assert_eq!(failed.returned(), None);
    }
}
