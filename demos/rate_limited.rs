use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing_callwrap::wrap::{infallible, RateLimit};
use tracing_callwrap::{Callable, CallableExt};

/// Example of a shared rate limit: four threads hammer a function that
/// allows 5 calls per second.
fn main() {
    let fetch = Arc::new(
        infallible("fetch", |id: u32| format!("item-{}", id))
            .with(RateLimit::new(5, Duration::from_secs(1))),
    );

    let start = Instant::now();
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let fetch = Arc::clone(&fetch);
            thread::spawn(move || {
                (0..3)
                    .filter_map(|i| fetch.call(worker * 10 + i).ok().flatten())
                    .count()
            })
        })
        .collect();

    let admitted: usize = handles
        .into_iter()
        .map(|h| h.join().unwrap_or(0))
        .sum();
    println!("admitted {} of 12 calls in {:?}", admitted, start.elapsed());

    thread::sleep(Duration::from_millis(1100));
    println!("after the window resets: {:?}", fetch.call(99));
}
