//! Environment variable names used by this crate to configure loggers
//! without touching code.
//!
//! Reads go through [`EnvSource`] so configuration resolution can be
//! driven from an explicit snapshot instead of the process environment.

use std::collections::HashMap;

/// Level threshold for loggers built without an explicit level,
/// e.g. `INFO`.
pub const LOG_LEVEL_ENV: &str = "CALLWRAP_LOG_LEVEL";

/// Directory for the log file. Setting it enables the file sink.
pub const LOG_PATH_ENV: &str = "CALLWRAP_LOG_PATH";

/// Base name of the log file; `.log` is appended.
pub const LOG_NAME_ENV: &str = "CALLWRAP_LOG_NAME";

/// A read-only view of environment variables.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;

    /// Whether `key` is set at all, whatever its value.
    fn is_set(&self, key: &str) -> bool {
        self.var(key).is_some()
    }
}

/// The live process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    // Non-UTF-8 values still count as set.
    fn is_set(&self, key: &str) -> bool {
        std::env::var_os(key).is_some()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Build a snapshot from `(key, value)` pairs.
pub fn snapshot<I, K, V>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
