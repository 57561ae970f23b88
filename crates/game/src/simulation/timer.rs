use std::time::{Duration, Instant};

/// Measures the wall-clock delta between successive calls. Each delta is
/// taken from the previous call, not from a fixed schedule.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    last_update: Instant,
}

impl Clock {
    pub fn new(now: Instant) -> Self {
        Self { last_update: now }
    }

    pub fn delta(&mut self, now: Instant) -> Duration {
        let delta = now.saturating_duration_since(self.last_update);
        self.last_update = now;
        delta
    }

    pub fn last_update(&self) -> Instant {
        self.last_update
    }
}

/// A period that counts down as elapsed time is fed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    period: Duration,
    remaining: Duration,
}

impl Countdown {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            remaining: period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn advance(&mut self, delta: Duration) {
        self.remaining = self.remaining.saturating_sub(delta);
    }

    pub fn lapsed(&self) -> bool {
        self.remaining.is_zero()
    }

    pub fn reset(&mut self) {
        self.remaining = self.period;
    }

    /// Advances by `delta` and, if that lapses the countdown, rearms it and
    /// returns true. Several whole periods inside one delta still fire once.
    pub fn poll(&mut self, delta: Duration) -> bool {
        self.advance(delta);
        if self.lapsed() {
            self.reset();
            true
        } else {
            false
        }
    }
}
