use std::rc::Rc;
use web_time::{Duration, Instant};

/// Source of the current instant for play-time accounting.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Rc<std::cell::Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(std::cell::Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Accumulates time across running intervals.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Stopwatch {
    accumulated: Duration,
    started_at: Option<Instant>,
}

impl Stopwatch {
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn start(&mut self, now: Instant) {
        assert!(self.started_at.is_none(), "stopwatch already running");
        self.started_at = Some(now);
    }

    /// Panics when not running.
    pub fn stop(&mut self, now: Instant) {
        let Some(started_at) = self.started_at.take() else {
            panic!("stopwatch stopped while not running");
        };
        self.accumulated += now.saturating_duration_since(started_at);
    }

    /// Total time, including the interval in progress.
    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(started_at) => self.accumulated + now.saturating_duration_since(started_at),
            None => self.accumulated,
        }
    }
}
