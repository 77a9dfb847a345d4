use super::{logger_for, preset_logger, Callable, CallableExt, Wrapper};
use crate::logger::Logger;
use crate::record::LogLevel;
use std::fmt::Display;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

/// Re-invokes a failing function after a pause.
///
/// **Defaults**
/// - `retries`: 3, i.e. at most 4 attempts.
/// - `delay`: 1 second between attempts.
/// - `infinite`: `false`. With `true`, `retries` is ignored and the
///   function is retried until it succeeds.
/// - `backoff`: 1.0, so the delay stays fixed. Larger values multiply
///   the delay after every failure, capped by `max_delay` if set.
///
/// Each attempt receives a clone of the original arguments. The thread
/// sleeps between attempts.
#[derive(Debug, Clone)]
pub struct Retry {
    retries: u32,
    delay: Duration,
    infinite: bool,
    backoff: f64,
    max_delay: Option<Duration>,
    logger: Option<Logger>,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            retries: 3,
            delay: Duration::from_secs(1),
            infinite: false,
            backoff: 1.0,
            max_delay: None,
            logger: None,
        }
    }
}

impl Retry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn infinite(mut self, infinite: bool) -> Self {
        self.infinite = infinite;
        self
    }

    /// Delay multiplier applied after each failure. Values below 1.0 (and
    /// NaN) are treated as 1.0.
    pub fn backoff(mut self, multiplier: f64) -> Self {
        self.backoff = if multiplier.is_finite() && multiplier > 1.0 {
            multiplier
        } else {
            1.0
        };
        self
    }

    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }
}

impl<C> Wrapper<C> for Retry {
    type Wrapped = Retried<C>;

    fn wrap(self, inner: C) -> Retried<C> {
        Retried {
            inner,
            retries: self.retries,
            delay: self.delay,
            infinite: self.infinite,
            backoff: self.backoff,
            max_delay: self.max_delay,
            logger: preset_logger(self.logger),
        }
    }
}

/// Wrap `inner` with [`Retry`] defaults.
pub fn retry<C>(inner: C) -> Retried<C> {
    Retry::new().wrap(inner)
}

/// A callable wrapped by [`Retry`].
#[derive(Debug)]
pub struct Retried<C> {
    inner: C,
    retries: u32,
    delay: Duration,
    infinite: bool,
    backoff: f64,
    max_delay: Option<Duration>,
    logger: OnceLock<Logger>,
}

impl<C> Retried<C> {
    fn next_delay(&self, current: Duration) -> Duration {
        if self.backoff <= 1.0 {
            return current;
        }
        let grown = Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff)
            .unwrap_or(Duration::MAX);
        match self.max_delay {
            Some(cap) => grown.min(cap),
            None => grown,
        }
    }
}

impl<C> CallableExt for Retried<C> {}

impl<A, C> Callable<A> for Retried<C>
where
    C: Callable<A>,
    C::Error: Display,
    A: Clone,
{
    type Output = C::Output;
    type Error = C::Error;

    fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the first success, or the error of the last attempt as-is.
    #[track_caller]
    fn call(&self, args: A) -> Result<C::Output, C::Error> {
        let mut attempt: u32 = 0;
        let mut delay = self.delay;

        loop {
            let error = match self.inner.call(args.clone()) {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let name = self.inner.name();
            let logger = logger_for(&self.logger, name);

            if self.infinite {
                logger.warning(format!("{} failed, retrying indefinitely: {}", name, error));
            } else if attempt < self.retries {
                logger.warning(format!(
                    "{} failed, retrying: {}, attempts left: {}",
                    name,
                    error,
                    self.retries - attempt - 1
                ));
                attempt += 1;
            } else {
                logger.log_exception(
                    LogLevel::Error,
                    format!("{} retry attempts failed: {}", name, error),
                    &error,
                );
                return Err(error);
            }

            thread::sleep(delay);
            delay = self.next_delay(delay);
        }
    }
}
