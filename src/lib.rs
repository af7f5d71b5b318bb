//! # co-next
//!
//! Adapts async handlers to pipelines that pass a completion callback
//! ("next") as one of their positional arguments.
//!
//! The adapted stage pulls the callback out of the argument list, runs the
//! handler on Tokio with the remaining arguments, and then:
//!
//! - calls `next` with no error when the handler succeeds, unless the stage
//!   is terminal or the handler returned `false`
//! - calls `next` with the error when the handler fails
//!
//! ## Example
//!
//! ```ignore
//! use co_next::{wrap, Arg, Args, BoxError, Options};
//!
//! #[tokio::main]
//! async fn main() {
//!     let stage = wrap(
//!         |args: Args<String>| async move {
//!             let session = load_session(args.value(0)).await?;
//!             Ok::<_, BoxError>(session.is_valid())
//!         },
//!         Options::default().return_handle(true),
//!     );
//!
//!     let handle = stage.call(vec![
//!         Arg::value(req),
//!         Arg::value(res),
//!         Arg::next(|err| Ok(())),
//!     ]);
//!     handle.unwrap().await.unwrap();
//! }
//! ```

pub mod error;
pub mod handler;
pub mod options;

mod adapter;
mod args;
mod next;

pub use adapter::{wrap, wrap_param, wrap_terminal, Adapted, Completion, RunHandle};
pub use args::{Arg, Args};
pub use error::{BoxError, HandlerError, HandlerPanic, OptionsError, RunError};
pub use handler::{Handler, Proceed};
pub use next::Next;
pub use options::Options;
