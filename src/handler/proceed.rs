//! Return-value convention for handlers.

use std::sync::Arc;

/// Decides, from a handler's return value, whether the completion callback
/// is invoked after a successful run.
///
/// Only a strict boolean `false` stops the pipeline. Every other value,
/// including `()`, `None` and `0`, lets it continue.
///
/// Handlers returning their own types opt in with an empty impl, which
/// always proceeds:
///
/// ```ignore
/// struct Rendered { status: u16 }
///
/// impl co_next::Proceed for Rendered {}
/// ```
pub trait Proceed {
    /// Returns false to stop the pipeline after this stage.
    fn proceeds(&self) -> bool {
        true
    }
}

impl Proceed for bool {
    fn proceeds(&self) -> bool {
        *self
    }
}

impl Proceed for serde_json::Value {
    fn proceeds(&self) -> bool {
        !matches!(self, serde_json::Value::Bool(false))
    }
}

impl<T: Proceed> Proceed for Box<T> {
    fn proceeds(&self) -> bool {
        (**self).proceeds()
    }
}

impl<T: Proceed> Proceed for Arc<T> {
    fn proceeds(&self) -> bool {
        (**self).proceeds()
    }
}

// Option<bool> is not a strict false even when it holds one.
impl<T> Proceed for Option<T> {}

impl<T> Proceed for Vec<T> {}

impl<A, B> Proceed for (A, B) {}

impl<A, B, C> Proceed for (A, B, C) {}

macro_rules! always_proceeds {
    ($($ty:ty),* $(,)?) => {
        $(impl Proceed for $ty {})*
    };
}

always_proceeds!(
    (),
    String,
    &'static str,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_false_stops() {
        assert!(!false.proceeds());
        assert!(true.proceeds());
        assert!(().proceeds());
        assert!(0i32.proceeds());
        assert!("".proceeds());
        assert!(String::new().proceeds());
    }

    #[test]
    fn test_option_is_not_strict_false() {
        assert!(Some(false).proceeds());
        assert!(None::<bool>.proceeds());
    }

    #[test]
    fn test_json_value() {
        assert!(!json!(false).proceeds());
        assert!(json!(true).proceeds());
        assert!(json!(null).proceeds());
        assert!(json!(0).proceeds());
        assert!(json!("false").proceeds());
    }

    #[test]
    fn test_boxed() {
        assert!(!Box::new(false).proceeds());
        assert!(Box::new(()).proceeds());
    }

    #[test]
    fn test_shared() {
        assert!(!Arc::new(false).proceeds());
        assert!(Arc::new(json!(true)).proceeds());
        assert!(!Arc::new(Box::new(false)).proceeds());
    }

    #[test]
    fn test_tuples_proceed() {
        assert!((false, false).proceeds());
        assert!((1u8, "a", ()).proceeds());
    }

    #[test]
    fn test_user_type_opts_in() {
        struct Rendered;
        impl Proceed for Rendered {}

        assert!(Rendered.proceeds());
    }
}
