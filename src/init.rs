use crate::env::{EnvSource, LOG_LEVEL_ENV, LOG_NAME_ENV, LOG_PATH_ENV};
use crate::layer::RecordLayer;
use crate::record::LogLevel;
use crate::sink::LogSink;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Dispatch;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// Base name of the log file when neither the builder nor
/// [`LOG_NAME_ENV`] provides one.
pub const DEFAULT_LOG_NAME: &str = "callwrap";

const LOG_FILE_EXTENSION: &str = ".log";

/// Values passed explicitly to a [`LoggerBuilder`](crate::logger::LoggerBuilder).
/// `None` means "not given", so the environment or the default applies.
#[derive(Clone, Debug, Default)]
pub struct LoggerOptions {
    pub level: Option<LogLevel>,
    pub file_name: Option<String>,
    pub path: Option<PathBuf>,
}

/// Fully resolved logger configuration.
///
/// **Fields**
/// - `name`: logger name attached to every record.
/// - `level`: minimum severity that is emitted.
/// - `file_name`: log file name, always ending in `.log`.
/// - `path`: directory of the log file; `None` disables the file sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggerConfig {
    pub name: String,
    pub level: LogLevel,
    pub file_name: String,
    pub path: Option<PathBuf>,
}

impl LoggerConfig {
    /// Resolve each setting from the explicit option first, then the
    /// environment, then the built-in default.
    ///
    /// **Returns**
    /// - the resolved config.
    /// - human-readable warnings for environment values that could not be
    ///   used (currently only an unknown level name).
    pub fn resolve(
        name: &str,
        options: &LoggerOptions,
        env: &dyn EnvSource,
    ) -> (LoggerConfig, Vec<String>) {
        let mut warnings = Vec::new();

        let level = match options.level {
            Some(level) => level,
            None => match non_empty(env.var(LOG_LEVEL_ENV)) {
                Some(raw) => raw.parse::<LogLevel>().unwrap_or_else(|e| {
                    warnings.push(format!(
                        "{} ignored ({}), using {}",
                        LOG_LEVEL_ENV,
                        e,
                        LogLevel::default()
                    ));
                    LogLevel::default()
                }),
                None => LogLevel::default(),
            },
        };

        let base = options
            .file_name
            .clone()
            .or_else(|| non_empty(env.var(LOG_NAME_ENV)))
            .unwrap_or_else(|| DEFAULT_LOG_NAME.to_string());
        let file_name = if base.ends_with(LOG_FILE_EXTENSION) {
            base
        } else {
            format!("{}{}", base, LOG_FILE_EXTENSION)
        };

        let path = options
            .path
            .clone()
            .or_else(|| non_empty(env.var(LOG_PATH_ENV)).map(PathBuf::from));

        let config = LoggerConfig {
            name: name.to_string(),
            level,
            file_name,
            path,
        };
        (config, warnings)
    }

    /// Full path of the log file, if the file sink is enabled.
    pub fn file_path(&self) -> Option<PathBuf> {
        self.path.as_ref().map(|dir| dir.join(&self.file_name))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Assemble the private dispatcher a logger emits through.
///
/// **Layers**
/// - coloured `fmt` output on stderr, when `console` is set.
/// - plain `fmt` output appended to the log file, when `config.path` is set.
/// - a [`RecordLayer`] feeding `sinks`, when any are given.
///
/// **Returns**
/// - the dispatcher.
/// - setup errors that were recovered from. A file sink that cannot be
///   created is left out; the other layers still work.
pub(crate) fn build_dispatch(
    config: &LoggerConfig,
    console: bool,
    sinks: Vec<Arc<dyn LogSink>>,
) -> (Dispatch, Vec<String>) {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut errors = Vec::new();

    if console {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);
        layers.push(console_layer.boxed());
    }

    if let Some(dir) = &config.path {
        match file_appender(dir, &config.file_name) {
            Ok(appender) => {
                let file_layer = fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(false);
                layers.push(file_layer.boxed());
            }
            Err(e) => errors.push(format!(
                "failed to attach log file sink at {}: {}",
                dir.join(&config.file_name).display(),
                e
            )),
        }
    }

    if !sinks.is_empty() {
        layers.push(RecordLayer::new(sinks).boxed());
    }

    let subscriber = Registry::default().with(layers);
    (Dispatch::new(subscriber), errors)
}

fn file_appender(
    dir: &Path,
    file_name: &str,
) -> Result<RollingFileAppender, Box<dyn std::error::Error + Send + Sync>> {
    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)?;
    Ok(appender)
}
