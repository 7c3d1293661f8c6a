//! Session generations and cancellable visual timers
//!
//! Every load, pause and stop draws a fresh generation from a
//! process-wide counter. Anything scheduled under an older generation
//! is stale and must no-op when it fires.

use std::sync::atomic::{AtomicU64, Ordering};

static GENERATION: AtomicU64 = AtomicU64::new(0);

/// Draw a new, never-before-used generation token
pub fn next_generation() -> u64 {
    GENERATION.fetch_add(1, Ordering::SeqCst) + 1
}

/// Visual notification carried by a timer
#[derive(Debug, Clone, PartialEq)]
pub enum VisualCue {
    Start(String),
    End(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    /// Clock seconds at which the timer fires
    pub at: f64,
    pub generation: u64,
    pub cue: VisualCue,
}

/// Pending timers, kept in firing order
///
/// Timers with equal deadlines fire in the order they were scheduled.
#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
}

impl TimerQueue {
    pub fn schedule(&mut self, at: f64, generation: u64, cue: VisualCue) {
        let index = self.timers.partition_point(|t| t.at <= at);
        self.timers.insert(index, Timer { at, generation, cue });
    }

    /// Remove and return every timer due at or before `now`
    pub fn take_due(&mut self, now: f64) -> Vec<Timer> {
        let due = self.timers.partition_point(|t| t.at <= now);
        self.timers.drain(..due).collect()
    }

    /// Drop every pending timer, returning how many were cancelled
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.timers.len();
        self.timers.clear();
        cancelled
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.timers.first().map(|t| t.at)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
