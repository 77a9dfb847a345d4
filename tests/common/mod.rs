use std::collections::HashMap;
use std::sync::Arc;

use tracing_callwrap::memory_sink::MemorySink;
use tracing_callwrap::Logger;

/// Logger with console off, an empty environment and an in-memory sink.
pub fn capture(name: &str) -> (Logger, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let logger = Logger::builder(name)
        .console(false)
        .env(HashMap::new())
        .sink(sink.clone())
        .build();
    (logger, sink)
}
