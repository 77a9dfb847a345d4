use super::{logger_for, preset_logger, Callable, CallableExt, Wrapper};
use crate::logger::Logger;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

/// Fixed-window admission control: at most `limit` calls per window of
/// `interval`, counted across every call to the same wrapped instance.
///
/// The window opens on the first call and is reset by the first call
/// arriving more than `interval` after it opened. Because the window is
/// fixed rather than sliding, up to `2 × limit` calls can be admitted in
/// a short span straddling a reset.
///
/// Rejected calls are not queued: the function is not run, an error is
/// logged and the wrapper returns `Ok(None)`.
#[derive(Debug, Clone)]
pub struct RateLimit {
    limit: u32,
    interval: Duration,
    logger: Option<Logger>,
}

impl RateLimit {
    /// `limit` is raised to 1 if given as 0.
    pub fn new(limit: u32, interval: Duration) -> Self {
        Self {
            limit: limit.max(1),
            interval,
            logger: None,
        }
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }
}

impl<C> Wrapper<C> for RateLimit {
    type Wrapped = RateLimited<C>;

    fn wrap(self, inner: C) -> RateLimited<C> {
        RateLimited {
            inner,
            limit: self.limit,
            interval: self.interval,
            window: Mutex::new(RateWindow::default()),
            logger: preset_logger(self.logger),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct RateWindow {
    window_start: Option<Instant>,
    call_count: u32,
}

impl RateWindow {
    fn admit(&mut self, now: Instant, limit: u32, interval: Duration) -> bool {
        if let Some(start) = self.window_start {
            if now.saturating_duration_since(start) > interval {
                self.window_start = None;
                self.call_count = 0;
            }
        }
        if self.window_start.is_none() {
            self.window_start = Some(now);
        }
        if self.call_count < limit {
            self.call_count += 1;
            true
        } else {
            false
        }
    }
}

/// A callable wrapped by [`RateLimit`]. Share it (e.g. through `Arc`) to
/// share its window.
#[derive(Debug)]
pub struct RateLimited<C> {
    inner: C,
    limit: u32,
    interval: Duration,
    window: Mutex<RateWindow>,
    logger: OnceLock<Logger>,
}

impl<C> RateLimited<C> {
    /// Count this call against the current window. The lock is released
    /// before the wrapped function runs, so re-entrant calls can't deadlock.
    fn try_admit(&self) -> bool {
        let now = Instant::now();
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        window.admit(now, self.limit, self.interval)
    }

    /// Calls admitted in the current window.
    pub fn calls_in_window(&self) -> u32 {
        self.window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .call_count
    }
}

impl<C> CallableExt for RateLimited<C> {}

impl<A, C> Callable<A> for RateLimited<C>
where
    C: Callable<A>,
{
    type Output = Option<C::Output>;
    type Error = C::Error;

    fn name(&self) -> &str {
        self.inner.name()
    }

    #[track_caller]
    fn call(&self, args: A) -> Result<Option<C::Output>, C::Error> {
        if self.try_admit() {
            return self.inner.call(args).map(Some);
        }
        let name = self.inner.name();
        logger_for(&self.logger, name).error(format!("Rate limit exceeded for {}", name));
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_sink::MemorySink;
    use crate::record::LogLevel;
    use crate::wrap::infallible;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[test]
    fn window_admits_limit_then_rejects() {
        let t0 = Instant::now();
        let interval = Duration::from_secs(1);
        let mut window = RateWindow::default();

        for _ in 0..5 {
            assert!(window.admit(t0, 5, interval));
        }
        assert!(!window.admit(t0 + Duration::from_millis(10), 5, interval));
        // Exactly `interval` later is still the same window.
        assert!(!window.admit(t0 + interval, 5, interval));

        let later = t0 + Duration::from_millis(1100);
        for _ in 0..5 {
            assert!(window.admit(later, 5, interval));
        }
        assert!(!window.admit(later, 5, interval));
        assert_eq!(window.window_start, Some(later));
    }

    #[test]
    fn boundary_burst_admits_twice_the_limit() {
        let t0 = Instant::now();
        let interval = Duration::from_millis(100);
        let mut window = RateWindow::default();

        assert!(window.admit(t0, 2, interval));
        let near_end = t0 + Duration::from_millis(99);
        assert!(window.admit(near_end, 2, interval));
        let just_after = t0 + Duration::from_millis(101);
        assert!(window.admit(just_after, 2, interval));
        assert!(window.admit(just_after, 2, interval));
        assert!(!window.admit(just_after, 2, interval));
    }

    #[test]
    fn rejection_logs_error_and_returns_none() {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::builder("limiter")
            .console(false)
            .env(HashMap::new())
            .sink(sink.clone())
            .build();
        let ping = infallible("ping", |_: ()| "pong")
            .with(RateLimit::new(2, Duration::from_secs(60)).logger(logger));

        assert_eq!(ping.call(()), Ok(Some("pong")));
        assert_eq!(ping.call(()), Ok(Some("pong")));
        assert_eq!(ping.call(()), Ok(None));
        assert_eq!(ping.calls_in_window(), 2);
        assert_eq!(sink.count_at(LogLevel::Error), 1);
        assert_eq!(sink.messages(), vec!["Rate limit exceeded for ping"]);
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        let limited = RateLimit::new(0, Duration::from_secs(60)).wrap(());
        assert_eq!(limited.limit, 1);
    }
}
