//! Adapter options.
//!
//! [`Options`] is merged over its defaults once per adaptation and is never
//! mutated afterwards. Overrides come either from the builder setters or
//! from a partial JSON object:
//!
//! ```ignore
//! use co_next::Options;
//!
//! let a = Options::default().next_index(1).return_handle(true);
//! let b = Options::from_json(r#"{"nextIndex": 1, "returnPromise": true}"#)?;
//! assert_eq!(a, b);
//! ```

use serde::Deserialize;

use crate::error::OptionsError;

/// Default position of the completion callback: `(req, res, next)`.
pub const DEFAULT_NEXT_INDEX: isize = 2;

/// Options controlling how a handler is adapted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Index of the completion callback in the argument list.
    /// Negative values count from the end.
    pub next_index: isize,
    /// Never call the completion callback after the handler succeeds.
    pub terminal: bool,
    /// Return the run handle from each call.
    #[serde(rename = "returnPromise", alias = "returnHandle")]
    pub return_handle: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            next_index: DEFAULT_NEXT_INDEX,
            terminal: false,
            return_handle: false,
        }
    }
}

impl Options {
    /// Parse a (possibly partial) JSON options object.
    ///
    /// Missing keys keep their default; unknown keys are ignored.
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the completion callback index.
    pub fn next_index(mut self, index: isize) -> Self {
        self.next_index = index;
        self
    }

    /// Set whether the completion callback is skipped after success.
    pub fn terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }

    /// Set whether calls return a [`RunHandle`](crate::RunHandle).
    pub fn return_handle(mut self, return_handle: bool) -> Self {
        self.return_handle = return_handle;
        self
    }

    /// Resolve `next_index` against an argument list of length `len`.
    ///
    /// Follows splice rules: a negative index is offset from the end and
    /// clamped at zero. Returns `None` when the index is past the end, in
    /// which case nothing is removed.
    pub fn resolve_index(&self, len: usize) -> Option<usize> {
        let index = if self.next_index < 0 {
            let back = self.next_index.unsigned_abs();
            len.saturating_sub(back)
        } else {
            self.next_index as usize
        };

        (index < len).then_some(index)
    }
}
