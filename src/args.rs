//! Positional arguments of a pipeline call.

use crate::next::Next;

/// One positional argument passed by the pipeline.
#[derive(Debug, Clone)]
pub enum Arg<T> {
    /// An ordinary value (request, response, route parameter, ...).
    Value(T),
    /// A completion callback.
    Next(Next),
}

impl<T> Arg<T> {
    /// Build a value argument.
    pub fn value(value: T) -> Self {
        Arg::Value(value)
    }

    /// Build a completion callback argument from a closure.
    pub fn next<F>(callback: F) -> Self
    where
        F: Fn(Option<crate::HandlerError>) -> Result<(), crate::BoxError> + Send + Sync + 'static,
    {
        Arg::Next(Next::new(callback))
    }

    /// Get the value, if this is a value argument.
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Arg::Value(v) => Some(v),
            Arg::Next(_) => None,
        }
    }

    /// Returns true if this argument is a completion callback.
    pub fn is_next(&self) -> bool {
        matches!(self, Arg::Next(_))
    }
}

impl<T> From<Next> for Arg<T> {
    fn from(next: Next) -> Self {
        Arg::Next(next)
    }
}

/// Arguments handed to an adapted handler, with the completion callback
/// already removed.
#[derive(Debug, Clone)]
pub struct Args<T> {
    items: Vec<Arg<T>>,
}

impl<T> Args<T> {
    /// Wrap an argument list.
    pub fn new(items: Vec<Arg<T>>) -> Self {
        Self { items }
    }

    /// Number of arguments.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no arguments.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the argument at `index`.
    pub fn get(&self, index: usize) -> Option<&Arg<T>> {
        self.items.get(index)
    }

    /// Get the value at `index`, skipping callback arguments.
    pub fn value(&self, index: usize) -> Option<&T> {
        self.get(index).and_then(Arg::as_value)
    }

    /// Iterate over the arguments.
    pub fn iter(&self) -> std::slice::Iter<'_, Arg<T>> {
        self.items.iter()
    }

    /// Consume into the plain values, dropping any callback arguments.
    pub fn into_values(self) -> Vec<T> {
        self.items
            .into_iter()
            .filter_map(|arg| match arg {
                Arg::Value(v) => Some(v),
                Arg::Next(_) => None,
            })
            .collect()
    }

    /// Consume into the raw argument list.
    pub fn into_inner(self) -> Vec<Arg<T>> {
        self.items
    }
}

/// Remove the argument at `index` from `items`.
///
/// The rest keep their relative order. Returns `None` without touching the
/// list when `index` is out of range.
pub(crate) fn take_at<T>(items: &mut Vec<Arg<T>>, index: Option<usize>) -> Option<Arg<T>> {
    index.map(|i| items.remove(i))
}
