//! Handler module - async pipeline stages.
//!
//! Provides:
//! - [`Handler`] - object-safe async handler over positional [`Args`](crate::Args)
//! - [`FnHandler`] - adapts an `async` closure into a [`Handler`]
//! - [`Proceed`] - decides from the return value whether the pipeline continues
//!
//! # Example
//!
//! ```ignore
//! use co_next::handler::{FnHandler, Handler};
//! use co_next::Args;
//!
//! let handler = FnHandler::new(|args: Args<String>| async move {
//!     let user = load_user(args.value(0)).await?;
//!     Ok::<_, co_next::BoxError>(user.is_active())
//! });
//! ```

mod closure;
mod proceed;

pub use closure::{BoxFuture, FnHandler, Handler, HandlerResult};
pub use proceed::Proceed;
