use crate::record::LogRecord;
use std::error::Error;

/// Destination for [`LogRecord`]s produced by a [`Logger`](crate::logger::Logger).
///
/// The console and file outputs are handled by `tracing-subscriber` layers;
/// a `LogSink` is for everything else (collecting records in tests,
/// forwarding to a custom store, etc). Sinks are called synchronously on
/// the thread that emitted the record.
pub trait LogSink: Send + Sync {
    /// Deliver a single record.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was accepted.
    /// - `Err(..)` if delivery failed. The failure is reported on stderr and
    ///   the record is dropped; it never reaches the code that logged.
    fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>>;
}
