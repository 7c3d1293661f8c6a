//! Monotonic time sources for the scheduler
//!
//! All clocks report seconds as `f64`. Only differences between readings
//! matter; the origin is whatever the clock picked.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

pub trait Clock {
    /// Current time in seconds
    fn now(&self) -> f64;
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone)]
pub struct InstantClock {
    origin: Instant,
}

impl Default for InstantClock {
    fn default() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Clock for InstantClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self { now: Rc::new(Cell::new(start)) }
    }

    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Browser clock reading `performance.now()`
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct PerformanceClock;

#[cfg(target_arch = "wasm32")]
impl Clock for PerformanceClock {
    fn now(&self) -> f64 {
        web_sys::window()
            .and_then(|window| window.performance())
            .map(|performance| performance.now() / 1000.0)
            .unwrap_or(0.0)
    }
}
