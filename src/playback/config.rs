//! Scheduler configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::header::TEMPO_RANGE_BPM;

/// Tempo used when a score declares none
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Configuration for a playback session
///
/// Deserializes from a partial object: missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerConfig {
    /// Period of the scheduling loop, in milliseconds
    pub tick_interval_ms: u64,
    /// How far ahead of "now" events are admitted, in milliseconds
    pub lookahead_ms: u64,
    /// Voice ceiling for the reference sound engine
    pub max_voices: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 25,
            lookahead_ms: 100,
            max_voices: 32,
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Lookahead window in seconds
    pub fn lookahead_secs(&self) -> f64 {
        self.lookahead_ms as f64 / 1000.0
    }
}

/// Seconds per beat for a tempo, falling back to the default tempo for
/// a tempo outside [`TEMPO_RANGE_BPM`]
pub fn seconds_per_beat(bpm: f64) -> f64 {
    let bpm = if (TEMPO_RANGE_BPM.0..=TEMPO_RANGE_BPM.1).contains(&bpm) {
        bpm
    } else {
        log::warn!("invalid tempo {} BPM, using {}", bpm, DEFAULT_TEMPO_BPM);
        DEFAULT_TEMPO_BPM
    };
    60.0 / bpm
}
