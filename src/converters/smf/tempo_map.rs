//! Tempo map and tick → seconds conversion

use serde::{Deserialize, Serialize};

/// 120 BPM
pub const DEFAULT_MICROS_PER_QUARTER: u32 = 500_000;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TempoChange {
    /// Absolute tick the tempo takes effect
    pub tick: u64,
    pub micros_per_quarter: u32,
}

impl TempoChange {
    pub fn bpm(&self) -> f64 {
        60_000_000.0 / self.micros_per_quarter.max(1) as f64
    }
}

/// Tempo changes merged from every track, sorted by tick
///
/// Always starts with an entry at tick 0 so every tick maps to a time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TempoMap {
    ticks_per_quarter: u16,
    changes: Vec<TempoChange>,
}

impl TempoMap {
    pub fn new(ticks_per_quarter: u16, mut changes: Vec<TempoChange>) -> Self {
        changes.sort_by_key(|change| change.tick);
        if changes.first().map_or(true, |first| first.tick > 0) {
            changes.insert(0, TempoChange { tick: 0, micros_per_quarter: DEFAULT_MICROS_PER_QUARTER });
        }
        Self { ticks_per_quarter: ticks_per_quarter.max(1), changes }
    }

    pub fn ticks_per_quarter(&self) -> u16 {
        self.ticks_per_quarter
    }

    pub fn changes(&self) -> &[TempoChange] {
        &self.changes
    }

    /// Tempo in effect at tick 0
    pub fn initial_bpm(&self) -> f64 {
        self.changes.first().map(TempoChange::bpm).unwrap_or(120.0)
    }

    /// Seconds elapsed from tick 0 to `tick`.
    ///
    /// Whole segments ending at or before `tick` contribute their full span
    /// at their own tempo; the final partial segment contributes the rest.
    /// Non-decreasing in `tick`.
    pub fn seconds_at(&self, tick: u64) -> f64 {
        let tpq = self.ticks_per_quarter as f64;
        let mut seconds = 0.0;

        for (index, change) in self.changes.iter().enumerate() {
            let seconds_per_quarter = change.micros_per_quarter as f64 / 1_000_000.0;
            match self.changes.get(index + 1) {
                Some(next) if next.tick <= tick => {
                    seconds += (next.tick - change.tick) as f64 / tpq * seconds_per_quarter;
                }
                _ => {
                    seconds += tick.saturating_sub(change.tick) as f64 / tpq * seconds_per_quarter;
                    break;
                }
            }
        }

        seconds
    }
}
