//! Error types for co-next.

use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinError;

/// Boxed error returned by handlers and completion callbacks.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A handler failure as seen by the completion callback and the run handle.
///
/// Shared so that the exact same error value reaches both sides.
pub type HandlerError = Arc<dyn StdError + Send + Sync + 'static>;

/// Failure of a run that the adapter could not recover.
///
/// Handler failures are not represented here: they are forwarded to the
/// completion callback. Only failures of the callback itself end up in a
/// `RunError`.
#[derive(Debug, Error)]
pub enum RunError {
    /// The completion callback returned an error.
    #[error("completion callback failed: {0}")]
    Next(#[source] BoxError),

    /// No argument was present at the configured callback index.
    #[error("no completion callback at argument index {index} ({len} arguments)")]
    MissingNext { index: isize, len: usize },

    /// The argument at the configured callback index is a value, not a callback.
    #[error("argument at index {index} is not a completion callback")]
    NotCallable { index: isize },

    /// The completion callback panicked.
    #[error("run panicked: {0}")]
    Panicked(String),
}

/// A panic inside a handler, forwarded to the completion callback as an error.
#[derive(Debug, Error)]
#[error("handler panicked: {message}")]
pub struct HandlerPanic {
    /// Panic message, when the payload was a string.
    pub message: String,
}

/// Errors raised while parsing adapter options.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using RunError.
pub type Result<T> = std::result::Result<T, RunError>;

/// Convert a handler error into its shared form.
pub(crate) fn share(err: BoxError) -> HandlerError {
    Arc::from(err)
}

/// Extract the message of a failed task, keeping the panic payload text.
pub(crate) fn join_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => panic_message(payload),
        Err(err) => err.to_string(),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        return (*s).to_string();
    }
    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(_) => "non-string panic payload".to_string(),
    }
}
