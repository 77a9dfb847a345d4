//! Composable behavior wrappers for plain functions.
//!
//! A [`Callable`] is a named function from one argument (use a tuple for
//! several) to a `Result`. Wrappers take a callable and return another
//! callable with the same argument and error types, so they stack by plain
//! composition:
//!
//! ```no_run
//! use std::time::Duration;
//! use tracing_callwrap::wrap::{func, Callable, CallableExt, Log, Retry};
//!
//! let divide = func("divide", |(a, b): (i32, i32)| {
//!     a.checked_div(b).ok_or("division by zero")
//! })
//! .with(Retry::new().retries(2).delay(Duration::from_millis(10)))
//! .with(Log::new());
//!
//! assert_eq!(divide.call((10, 2)), Ok(5));
//! ```
//!
//! The wrapper applied last is the outermost one and acts first.
//!
//! Every `call` is `#[track_caller]`, so log records emitted by any layer
//! are attributed to the code that made the outermost call.

mod env_gate;
mod log;
mod rate_limit;
mod retry;
mod to_json;

pub use env_gate::{EnvGate, Gated};
pub use log::{log, Log, Logged};
pub use rate_limit::{RateLimit, RateLimited};
pub use retry::{retry, Retried, Retry};
pub use to_json::{to_json, Encoded, ToJson};

use std::borrow::Cow;
use std::convert::Infallible;
use std::sync::OnceLock;

use crate::logger::Logger;

/// A named function that can be wrapped.
pub trait Callable<A> {
    type Output;
    type Error;

    /// Name used in log messages.
    fn name(&self) -> &str;

    #[track_caller]
    fn call(&self, args: A) -> Result<Self::Output, Self::Error>;
}

/// Configuration that turns a callable `C` into a wrapped callable.
pub trait Wrapper<C> {
    type Wrapped;

    fn wrap(self, inner: C) -> Self::Wrapped;
}

/// `.with(wrapper)` for every callable in this module.
pub trait CallableExt: Sized {
    fn with<W>(self, wrapper: W) -> W::Wrapped
    where
        W: Wrapper<Self>,
    {
        wrapper.wrap(self)
    }
}

/// A closure or fn item with a name attached.
#[derive(Clone)]
pub struct Func<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> Func<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Func { name: name.into(), f }
    }
}

impl<F> std::fmt::Debug for Func<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Func").field("name", &self.name).finish()
    }
}

impl<A, T, E, F> Callable<A> for Func<F>
where
    F: Fn(A) -> Result<T, E>,
{
    type Output = T;
    type Error = E;

    fn name(&self) -> &str {
        &self.name
    }

    #[track_caller]
    fn call(&self, args: A) -> Result<T, E> {
        (self.f)(args)
    }
}

impl<F> CallableExt for Func<F> {}

/// Name a fallible function so it can be wrapped.
pub fn func<A, T, E, F>(name: impl Into<Cow<'static, str>>, f: F) -> Func<F>
where
    F: Fn(A) -> Result<T, E>,
{
    Func::new(name, f)
}

/// Name an infallible function so it can be wrapped; its error type is
/// [`Infallible`].
pub fn infallible<A, T, F>(
    name: impl Into<Cow<'static, str>>,
    f: F,
) -> Func<impl Fn(A) -> Result<T, Infallible>>
where
    F: Fn(A) -> T,
{
    Func::new(name, move |args: A| -> Result<T, Infallible> { Ok(f(args)) })
}

/// The logger a wrapper reports through: the one configured explicitly,
/// or one named after the wrapped function, created on first use.
///
/// Built outside a closure so setup warnings are attributed to the caller.
#[track_caller]
pub(crate) fn logger_for<'a>(slot: &'a OnceLock<Logger>, name: &str) -> &'a Logger {
    if let Some(logger) = slot.get() {
        return logger;
    }
    // A concurrent first call may win the race; its logger is kept.
    let _ = slot.set(Logger::new(name));
    slot.get_or_init(|| Logger::new(name))
}

pub(crate) fn preset_logger(logger: Option<Logger>) -> OnceLock<Logger> {
    let slot = OnceLock::new();
    if let Some(logger) = logger {
        let _ = slot.set(logger);
    }
    slot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn func_forwards_arguments_and_errors() {
        let parse = func("parse", |s: String| s.parse::<i32>());
        assert_eq!(parse.name(), "parse");
        assert_eq!(parse.call("42".to_string()), Ok(42));
        assert!(parse.call("x".to_string()).is_err());
    }

    #[test]
    fn infallible_wraps_in_ok() {
        let add = infallible("add", |(a, b): (i32, i32)| a + b);
        assert_eq!(add.name(), "add");
        assert_eq!(add.call((2, 3)), Ok(5));
    }

    #[test]
    fn preset_logger_is_used() {
        let logger = Logger::builder("preset").console(false).build();
        let slot = preset_logger(Some(logger));
        assert_eq!(logger_for(&slot, "ignored").name(), "preset");

        let empty = preset_logger(None);
        assert!(empty.get().is_none());
    }
}
