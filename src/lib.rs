//! Function-call instrumentation on top of `tracing`.
//!
//! - [`logger::Logger`]: leveled logger with caller attribution and a
//!   private dispatcher per instance (console, file and custom sinks).
//! - [`wrap`]: composable wrappers that log, retry, rate-limit, JSON-encode
//!   or environment-gate a function.
//! - [`encoder`]: JSON encoding that never fails.
//! - [`cache`]: JSON value cache over a key-value store.

pub mod record;
pub mod sink;
pub mod layer;
pub mod memory_sink;

pub mod caller;
pub mod env;
pub mod init;
pub mod logger;

pub mod duration;
pub mod encoder;
pub mod wrap;

pub mod cache;

#[cfg(feature = "redis")]
pub mod redis_store;

pub use logger::{Logger, LoggerBuilder};
pub use record::{LogLevel, LogRecord};
pub use wrap::{func, infallible, Callable, CallableExt};
