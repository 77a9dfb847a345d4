use super::{Callable, CallableExt, Wrapper};
use crate::env::{EnvSource, ProcessEnv};
use std::fmt;
use std::sync::Arc;

/// Runs the wrapped function only when an environment variable allows it.
///
/// Without an expected value the variable only has to be set (to anything,
/// including the empty string). With one, its current value must match
/// exactly. The variable is read on every call. A gated call does not run
/// the function and returns `Ok(None)`.
#[derive(Clone)]
pub struct EnvGate {
    variable: String,
    value: Option<String>,
    env: Arc<dyn EnvSource>,
}

impl EnvGate {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            value: None,
            env: Arc::new(ProcessEnv),
        }
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Read the variable from `env` instead of the process environment.
    pub fn env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    fn is_open(&self) -> bool {
        match &self.value {
            None => self.env.is_set(&self.variable),
            Some(expected) => self.env.var(&self.variable).as_deref() == Some(expected.as_str()),
        }
    }
}

impl fmt::Debug for EnvGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvGate")
            .field("variable", &self.variable)
            .field("value", &self.value)
            .finish()
    }
}

impl<C> Wrapper<C> for EnvGate {
    type Wrapped = Gated<C>;

    fn wrap(self, inner: C) -> Gated<C> {
        Gated { inner, gate: self }
    }
}

/// A callable wrapped by [`EnvGate`].
#[derive(Debug)]
pub struct Gated<C> {
    inner: C,
    gate: EnvGate,
}

impl<C> CallableExt for Gated<C> {}

impl<A, C> Callable<A> for Gated<C>
where
    C: Callable<A>,
{
    type Output = Option<C::Output>;
    type Error = C::Error;

    fn name(&self) -> &str {
        self.inner.name()
    }

    #[track_caller]
    fn call(&self, args: A) -> Result<Option<C::Output>, C::Error> {
        if !self.gate.is_open() {
            return Ok(None);
        }
        self.inner.call(args).map(Some)
    }
}
