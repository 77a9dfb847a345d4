use super::{logger_for, preset_logger, Callable, CallableExt, Wrapper};
use crate::encoder;
use crate::logger::Logger;
use crate::record::LogLevel;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Logs each call, its return value and how long it took.
///
/// **Defaults**
/// - `condition`: `true`. With `false` the wrapped function runs with no
///   logging work at all.
/// - `level`: [`LogLevel::Debug`], used for all three messages.
/// - `logger`: a [`Logger`] named after the wrapped function, created on
///   first call.
#[derive(Debug, Clone)]
pub struct Log {
    condition: bool,
    level: LogLevel,
    logger: Option<Logger>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            condition: true,
            level: LogLevel::Debug,
            logger: None,
        }
    }
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, condition: bool) -> Self {
        self.condition = condition;
        self
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }
}

impl<C> Wrapper<C> for Log {
    type Wrapped = Logged<C>;

    fn wrap(self, inner: C) -> Logged<C> {
        Logged {
            inner,
            condition: self.condition,
            level: self.level,
            logger: preset_logger(self.logger),
        }
    }
}

/// Wrap `inner` with [`Log`] defaults.
pub fn log<C>(inner: C) -> Logged<C> {
    Log::new().wrap(inner)
}

/// A callable wrapped by [`Log`].
#[derive(Debug)]
pub struct Logged<C> {
    inner: C,
    condition: bool,
    level: LogLevel,
    logger: OnceLock<Logger>,
}

impl<C> CallableExt for Logged<C> {}

impl<A, C> Callable<A> for Logged<C>
where
    C: Callable<A>,
    A: Debug,
    C::Output: Serialize + Debug,
{
    type Output = C::Output;
    type Error = C::Error;

    fn name(&self) -> &str {
        self.inner.name()
    }

    /// On `Err` only the call message has been logged; the error is
    /// returned untouched.
    #[track_caller]
    fn call(&self, args: A) -> Result<C::Output, C::Error> {
        if !self.condition {
            return self.inner.call(args);
        }

        let name = self.inner.name();
        let logger = logger_for(&self.logger, name);
        let start = Instant::now();

        logger.log(self.level, call_message(name, &args));
        let result = self.inner.call(args)?;
        logger.log(self.level, return_message(name, &result));

        let elapsed = elapsed_millis(start.elapsed());
        logger.log(self.level, format!("{} executed: {} milliseconds", name, elapsed));
        Ok(result)
    }
}

fn call_message<A: Debug>(name: &str, args: &A) -> String {
    let rendered = format!("{:?}", args);
    if rendered == "()" {
        format!("{} call:", name)
    } else {
        format!("{} call: args:{}", name, rendered)
    }
}

fn return_message<T: Serialize + Debug>(name: &str, result: &T) -> String {
    format!(
        "{} return: {} {}",
        name,
        encoder::to_string(result),
        std::any::type_name::<T>()
    )
}

/// Milliseconds rounded to four decimal places.
fn elapsed_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0 * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_sink::MemorySink;
    use crate::wrap::{func, infallible};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn capture() -> (Logger, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::builder("log-wrapper")
            .console(false)
            .env(HashMap::new())
            .sink(sink.clone())
            .build();
        (logger, sink)
    }

    #[test]
    fn success_emits_call_return_and_duration() {
        let (logger, sink) = capture();
        let add = infallible("add", |(a, b): (i32, i32)| a + b)
            .with(Log::new().level(LogLevel::Info).logger(logger));

        assert_eq!(add.call((2, 3)), Ok(5));

        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.level == LogLevel::Info));
        assert_eq!(records[0].message, "add call: args:(2, 3)");
        assert_eq!(records[1].message, "add return: 5 i32");
        assert!(records[2].message.starts_with("add executed: "));
        assert!(records[2].message.ends_with(" milliseconds"));
    }

    #[test]
    fn disabled_condition_logs_nothing() {
        let (logger, sink) = capture();
        let fail = func("fail", |_: ()| Err::<(), _>("nope"))
            .with(Log::new().condition(false).logger(logger.clone()));
        let ok = infallible("ok", |_: ()| 1).with(Log::new().condition(false).logger(logger));

        assert_eq!(fail.call(()), Err("nope"));
        assert_eq!(ok.call(()), Ok(1));
        assert!(sink.is_empty());
    }

    #[test]
    fn error_stops_after_call_message() {
        let (logger, sink) = capture();
        let divide = func("divide", |(a, b): (i32, i32)| a.checked_div(b).ok_or("division by zero"))
            .with(Log::new().logger(logger));

        assert_eq!(divide.call((1, 0)), Err("division by zero"));
        assert_eq!(sink.messages(), vec!["divide call: args:(1, 0)"]);
    }

    #[test]
    fn unit_arguments_are_omitted_and_return_is_json() {
        #[derive(Debug, Serialize)]
        struct Status {
            healthy: bool,
        }

        let (logger, sink) = capture();
        let status = infallible("status", |_: ()| Status { healthy: true }).with(Log::new().logger(logger));
        status.call(()).unwrap();

        let messages = sink.messages();
        assert_eq!(messages[0], "status call:");
        assert!(messages[1].starts_with("status return: {\"healthy\":true} "));
        assert!(messages[1].ends_with("Status"));
    }

    #[test]
    fn bare_form_uses_defaults_and_a_logger_named_after_the_function() {
        let add = log(infallible("add", |(a, b): (i32, i32)| a + b));
        assert!(add.condition);
        assert_eq!(add.level, LogLevel::Debug);
        assert!(add.logger.get().is_none());

        assert_eq!(add.call((2, 3)), Ok(5));
        assert_eq!(add.logger.get().map(Logger::name), Some("add"));
    }

    #[test]
    fn elapsed_is_rounded_to_four_places() {
        assert_eq!(elapsed_millis(Duration::from_nanos(1_234_567)), 1.2346);
        assert_eq!(elapsed_millis(Duration::ZERO), 0.0);
    }

    #[test]
    fn level_below_logger_threshold_is_filtered_by_logger() {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::builder("quiet")
            .level(LogLevel::Warning)
            .console(false)
            .env(HashMap::new())
            .sink(sink.clone())
            .build();
        let id = infallible("id", |x: u8| x).with(Log::new().logger(logger));
        assert_eq!(id.call(7), Ok(7));
        assert!(sink.is_empty());
    }
}
