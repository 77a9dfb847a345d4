use crate::record::{LogLevel, LogRecord};
use crate::sink::LogSink;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Field names the [`Logger`](crate::logger::Logger) attaches to every event.
pub(crate) const LOGGER_FIELD: &str = "logger";
pub(crate) const LEVEL_FIELD: &str = "level_name";
pub(crate) const CALLER_FILENAME_FIELD: &str = "caller_filename";
pub(crate) const CALLER_LINENO_FIELD: &str = "caller_lineno";
pub(crate) const EXCEPTION_FIELD: &str = "exception";

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them to a set of [`LogSink`]s.
///
/// Delivery is synchronous: a record reaches every sink before the
/// logging call returns. A failing sink is reported on stderr and skipped.
pub struct RecordLayer {
    sinks: Vec<Arc<dyn LogSink>>,
    /// Total events seen by the layer.
    pub total_events: Arc<AtomicU64>,
    /// Records accepted by a sink.
    pub delivered_records: Arc<AtomicU64>,
    /// Records a sink refused.
    pub failed_records: Arc<AtomicU64>,
}

impl RecordLayer {
    pub fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Self {
            sinks,
            total_events: Arc::new(AtomicU64::new(0)),
            delivered_records: Arc::new(AtomicU64::new(0)),
            failed_records: Arc::new(AtomicU64::new(0)),
        }
    }

    fn deliver(&self, record: &LogRecord) {
        for sink in &self.sinks {
            match sink.send(record) {
                Ok(()) => {
                    self.delivered_records.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    self.failed_records.fetch_add(1, Ordering::Relaxed);
                    eprintln!("log sink send failed, dropping record: {}", e);
                }
            }
        }
    }
}

impl<S> Layer<S> for RecordLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let record = record_from_fields(*event.metadata().level(), fields, message);
        self.deliver(&record);
    }
}

fn record_from_fields(
    fallback: tracing::Level,
    mut fields: BTreeMap<String, serde_json::Value>,
    message: Option<String>,
) -> LogRecord {
    let mut take_str = |key: &str| match fields.remove(key) {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
        None => None,
    };

    let name = take_str(LOGGER_FIELD).unwrap_or_default();
    let level = take_str(LEVEL_FIELD)
        .and_then(|l| l.parse::<LogLevel>().ok())
        .unwrap_or_else(|| level_from_tracing(fallback));
    let caller_filename = take_str(CALLER_FILENAME_FIELD)
        .unwrap_or_else(|| crate::caller::UNKNOWN_FILENAME.to_string());
    let exception = take_str(EXCEPTION_FIELD);
    let caller_lineno = fields
        .remove(CALLER_LINENO_FIELD)
        .and_then(|v| v.as_u64())
        .and_then(|l| u32::try_from(l).ok())
        .unwrap_or(0);

    LogRecord {
        timestamp: Utc::now(),
        name,
        level,
        message: message.unwrap_or_default(),
        caller_filename,
        caller_lineno,
        exception,
        fields,
    }
}

fn level_from_tracing(level: tracing::Level) -> LogLevel {
    match level {
        tracing::Level::ERROR => LogLevel::Error,
        tracing::Level::WARN => LogLevel::Warning,
        tracing::Level::INFO => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

use tracing::field::{Field, Visit};

pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, serde_json::Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    // `format_args!` messages and `%`-formatted fields arrive here.
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{:?}", value);
        if field.name() == "message" {
            *self.message = Some(rendered);
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(rendered));
        }
    }
}
