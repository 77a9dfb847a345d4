use crate::caller::CallerFrame;
use crate::env::{EnvSource, ProcessEnv};
use crate::init::{build_dispatch, LoggerConfig, LoggerOptions};
use crate::record::LogLevel;
use crate::sink::LogSink;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{dispatcher, Dispatch, Level};

/// Leveled logger that attributes every record to the code that called
/// it, even when the call is routed through several wrapper layers.
///
/// Each logger owns a private `tracing` dispatcher, so level, log file and
/// sinks are per instance and never touch the global subscriber. Cloning
/// is cheap and clones share outputs.
///
/// ```no_run
/// use tracing_callwrap::logger::Logger;
///
/// let logger = Logger::new("billing");
/// logger.info("invoice sent");
/// ```
#[derive(Clone, Debug)]
pub struct Logger {
    config: Arc<LoggerConfig>,
    dispatch: Dispatch,
}

impl Logger {
    /// Logger configured from the process environment and defaults.
    #[track_caller]
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder {
            name: name.into(),
            options: LoggerOptions::default(),
            console: true,
            sinks: Vec::new(),
            env: Arc::new(ProcessEnv),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn level(&self) -> LogLevel {
        self.config.level
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.config.level
    }

    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.emit(LogLevel::Debug, message.as_ref(), None);
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) {
        self.emit(LogLevel::Info, message.as_ref(), None);
    }

    #[track_caller]
    pub fn warning(&self, message: impl AsRef<str>) {
        self.emit(LogLevel::Warning, message.as_ref(), None);
    }

    #[track_caller]
    pub fn critical(&self, message: impl AsRef<str>) {
        self.emit(LogLevel::Critical, message.as_ref(), None);
    }

    /// Log at `Error` with the current backtrace attached as the
    /// exception. The trace is captured regardless of `RUST_BACKTRACE`;
    /// it is only left out on platforms without backtrace support.
    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) {
        if !self.enabled(LogLevel::Error) {
            return;
        }
        let trace = Backtrace::force_capture();
        let exception = match trace.status() {
            BacktraceStatus::Captured => Some(trace.to_string()),
            _ => None,
        };
        self.emit(LogLevel::Error, message.as_ref(), exception);
    }

    /// Log at `Error` with `error` and its `source()` chain attached.
    #[track_caller]
    pub fn error_with(&self, message: impl AsRef<str>, error: &(dyn Error + 'static)) {
        self.emit(LogLevel::Error, message.as_ref(), Some(render_chain(error)));
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        self.emit(level, message.as_ref(), None);
    }

    /// Log at any level with an explicit exception description attached.
    #[track_caller]
    pub fn log_exception(&self, level: LogLevel, message: impl AsRef<str>, exception: &dyn fmt::Display) {
        if !self.enabled(level) {
            return;
        }
        self.emit(level, message.as_ref(), Some(exception.to_string()));
    }

    #[track_caller]
    fn emit(&self, level: LogLevel, message: &str, exception: Option<String>) {
        if !self.enabled(level) {
            return;
        }
        let frame = CallerFrame::current();
        let name = self.config.name.as_str();
        dispatcher::with_default(&self.dispatch, || {
            emit_event(level, name, &frame, exception.as_deref(), message)
        });
    }
}

fn render_chain(error: &(dyn Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str("\ncaused by: ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

// `tracing` callsites are static, so the level has to be a constant.
macro_rules! event_at {
    ($lvl:expr, $level:expr, $name:expr, $frame:expr, $exception:expr, $message:expr) => {
        tracing::event!(
            $lvl,
            logger = $name,
            level_name = $level.as_str(),
            caller_filename = $frame.filename.as_str(),
            caller_lineno = $frame.line,
            exception = $exception,
            "{}",
            $message
        )
    };
}

fn emit_event(
    level: LogLevel,
    name: &str,
    frame: &CallerFrame,
    exception: Option<&str>,
    message: &str,
) {
    match level.as_tracing() {
        Level::ERROR => event_at!(Level::ERROR, level, name, frame, exception, message),
        Level::WARN => event_at!(Level::WARN, level, name, frame, exception, message),
        Level::INFO => event_at!(Level::INFO, level, name, frame, exception, message),
        _ => event_at!(Level::DEBUG, level, name, frame, exception, message),
    }
}

/// Builder for [`Logger`]. Every setting left unset is resolved from the
/// environment (see [`crate::env`]) and then from defaults.
pub struct LoggerBuilder {
    name: String,
    options: LoggerOptions,
    console: bool,
    sinks: Vec<Arc<dyn LogSink>>,
    env: Arc<dyn EnvSource>,
}

impl LoggerBuilder {
    pub fn level(mut self, level: LogLevel) -> Self {
        self.options.level = Some(level);
        self
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.options.file_name = Some(file_name.into());
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.path = Some(path.into());
        self
    }

    /// Toggle the coloured stderr output (on by default).
    pub fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Also deliver every record to `sink`.
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Resolve unset options from `env` instead of the process environment.
    pub fn env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Resolve the configuration and assemble the outputs.
    ///
    /// Problems found along the way (an unusable level in the environment,
    /// a log file that cannot be created) are logged through the new
    /// logger itself; the logger is always returned.
    #[track_caller]
    pub fn build(self) -> Logger {
        let (config, warnings) = LoggerConfig::resolve(&self.name, &self.options, &*self.env);
        let (dispatch, errors) = build_dispatch(&config, self.console, self.sinks);
        let logger = Logger {
            config: Arc::new(config),
            dispatch,
        };
        for warning in &warnings {
            logger.warning(warning);
        }
        for error in &errors {
            logger.error(error);
        }
        logger
    }
}
