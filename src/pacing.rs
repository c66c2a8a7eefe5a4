use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, d: Duration);
}

#[derive(Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant { Instant::now() }
    async fn sleep(&self, d: Duration) { tokio::time::sleep(d).await }
}

/// Minimum spacing between the end of one unit of work and the start of the next.
///
/// `wait()` sleeps only for whatever part of `interval` has not already elapsed
/// since the last `stamp()`. The first wait is immediate.
pub struct Pacer {
    interval: Duration,
    clock: Arc<dyn Clock>,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Pacer { interval, clock, last: Mutex::new(None) }
    }

    pub async fn wait(&self) {
        let due = self.last.lock().unwrap_or_else(|e| e.into_inner()).map(|t| t + self.interval);
        if let Some(due) = due {
            let now = self.clock.now();
            if due > now { self.clock.sleep(due - now).await; }
        }
        self.stamp();
    }

    /// Restart the interval from now, typically right after the paced request finished.
    pub fn stamp(&self) {
        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(self.clock.now());
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Virtual clock: sleeping advances time instantly and is recorded.
    pub struct ManualClock {
        base: Instant,
        offset: Mutex<Duration>,
        sleeps: Mutex<Vec<Duration>>,
    }

    impl ManualClock {
        pub fn new() -> Arc<Self> {
            Arc::new(ManualClock { base: Instant::now(), offset: Mutex::new(Duration::ZERO), sleeps: Mutex::new(Vec::new()) })
        }

        pub fn advance(&self, d: Duration) { *self.offset.lock().unwrap() += d; }

        pub fn sleeps(&self) -> Vec<Duration> { self.sleeps.lock().unwrap().clone() }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn now(&self) -> Instant { self.base + *self.offset.lock().unwrap() }
        async fn sleep(&self, d: Duration) {
            self.sleeps.lock().unwrap().push(d);
            self.advance(d);
        }
    }
}
