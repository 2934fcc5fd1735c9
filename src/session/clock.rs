use std::time::{Duration, Instant};

/// Monotonic time source for the run loop.
///
/// Times are offsets from an arbitrary fixed origin; only differences are meaningful.
pub trait Clock {
    fn now(&self) -> Duration;
    /// Block until `now() >= deadline`. Returns immediately when the deadline has passed.
    fn sleep_until(&mut self, deadline: Duration);
}

/// Wall clock backed by [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep_until(&mut self, deadline: Duration) {
        let now = self.now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
    }
}

/// Deterministic clock for tests: sleeping jumps straight to the deadline.
///
/// An optional per-tick cost is added after every sleep to model frames that take longer to
/// produce than the frame interval.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManualClock {
    now: Duration,
    tick_cost: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Charge `cost` of simulated work after every `sleep_until`.
    pub fn with_tick_cost(mut self, cost: Duration) -> Self {
        self.tick_cost = cost;
        self
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep_until(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline) + self.tick_cost;
    }
}
