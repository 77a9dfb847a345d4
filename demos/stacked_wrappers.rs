use std::sync::Arc;
use std::time::Duration;

use tracing_callwrap::memory_sink::MemorySink;
use tracing_callwrap::wrap::{func, Log, Retry};
use tracing_callwrap::{Callable, CallableExt, LogLevel, Logger};

/// Example of stacking wrappers: `divide` is retried, and the retried
/// function is logged. Records go to stderr and to an in-memory sink so
/// we can print what each layer reported.
fn main() {
    let sink = Arc::new(MemorySink::new());
    let logger = Logger::builder("divide")
        .level(LogLevel::Debug)
        .sink(sink.clone())
        .build();

    let divide = func("divide", |(a, b): (i32, i32)| {
        a.checked_div(b).ok_or("division by zero")
    })
    .with(
        Retry::new()
            .retries(2)
            .delay(Duration::from_millis(50))
            .logger(logger.clone()),
    )
    .with(Log::new().logger(logger));

    println!("10 / 2 = {:?}", divide.call((10, 2)));
    println!("1 / 0 = {:?}", divide.call((1, 0)));

    for record in sink.records() {
        println!(
            "[{}] {}:{} {}",
            record.level, record.caller_filename, record.caller_lineno, record.message
        );
    }
}
