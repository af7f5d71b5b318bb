//! Completion callback handed to a pipeline stage.
//!
//! A [`Next`] has two signals:
//! - `proceed` - continue with the next stage
//! - `fail` - abort the pipeline with an error
//!
//! Both consume the callback, so a run can signal at most once.
//!
//! # Example
//!
//! ```ignore
//! let next = Next::new(|err| {
//!     if let Some(err) = err {
//!         eprintln!("pipeline aborted: {err}");
//!     }
//!     Ok(())
//! });
//! next.proceed()?;
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, HandlerError};

type Callback = dyn Fn(Option<HandlerError>) -> Result<(), BoxError> + Send + Sync;

/// Completion callback ("next") of a pipeline stage.
///
/// `Next` is `Clone` so the pipeline can keep a copy, but each copy can be
/// invoked only once.
#[derive(Clone)]
pub struct Next {
    callback: Arc<Callback>,
}

impl Next {
    /// Wrap a closure as a completion callback.
    ///
    /// The closure receives `None` to continue, or `Some(err)` to abort.
    /// Returning `Err` reports a failure of the callback itself.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Option<HandlerError>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Signal that the pipeline should continue.
    pub fn proceed(self) -> Result<(), BoxError> {
        (self.callback)(None)
    }

    /// Signal that the pipeline should abort with `err`.
    pub fn fail(self, err: HandlerError) -> Result<(), BoxError> {
        (self.callback)(Some(err))
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}
