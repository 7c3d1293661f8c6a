//! Flattening scores into a time-sorted event list

use serde::{Deserialize, Serialize};

use crate::converters::ResolvedNote;
use crate::models::Mom;

/// One sounding note as the scheduler sees it
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlatEvent {
    pub id: String,
    pub midi: u8,
    pub velocity: f64,
    pub start_beat: f64,
    pub duration_beats: f64,
}

impl FlatEvent {
    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.duration_beats
    }
}

/// Flatten every note of a MOM (chord members included, rests dropped),
/// sorted by start beat. Notes starting together keep score order.
pub fn flatten(mom: &Mom) -> Vec<FlatEvent> {
    let mut events: Vec<FlatEvent> = mom
        .notes()
        .map(|note| FlatEvent {
            id: note.id.clone(),
            midi: note.midi,
            velocity: note.velocity,
            start_beat: note.start,
            duration_beats: note.duration,
        })
        .collect();
    events.sort_by(|a, b| a.start_beat.total_cmp(&b.start_beat));
    events
}

/// Flatten notes resolved from a binary track, converting seconds to
/// beats at `bpm` and 0..=127 velocities to 0.0..=1.0
pub fn flatten_resolved(notes: &[ResolvedNote], bpm: f64) -> Vec<FlatEvent> {
    let beats_per_second = 1.0 / super::config::seconds_per_beat(bpm);
    let mut events: Vec<FlatEvent> = notes
        .iter()
        .enumerate()
        .map(|(index, note)| FlatEvent {
            id: format!("m{}", index + 1),
            midi: note.key,
            velocity: note.velocity as f64 / 127.0,
            start_beat: note.start * beats_per_second,
            duration_beats: note.duration * beats_per_second,
        })
        .collect();
    events.sort_by(|a, b| a.start_beat.total_cmp(&b.start_beat));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_text_notation;

    #[test]
    fn test_flatten_skips_rests_and_opens_chords() {
        let outcome = parse_text_notation("X:1\nL:1/4\nK:C\nC z [EG] c|\n");
        let events = flatten(&outcome.mom);
        let midis: Vec<u8> = events.iter().map(|e| e.midi).collect();
        assert_eq!(midis, vec![60, 64, 67, 72]);
        let starts: Vec<f64> = events.iter().map(|e| e.start_beat).collect();
        assert_eq!(starts, vec![0.0, 0.5, 0.5, 0.75]);
    }

    #[test]
    fn test_flatten_is_sorted_across_voices() {
        let text = "X:1\nL:1/4\nK:C\nV:1\nC D|\nV:2\nE, F,|\n";
        let events = flatten(&parse_text_notation(text).mom);
        assert!(events.windows(2).all(|w| w[0].start_beat <= w[1].start_beat));
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_flatten_resolved_converts_units() {
        let notes = vec![
            ResolvedNote {
                track: 0,
                channel: 0,
                key: 64,
                velocity: 127,
                start_tick: 480,
                end_tick: 960,
                start: 0.5,
                duration: 0.5,
            },
            ResolvedNote {
                track: 0,
                channel: 0,
                key: 60,
                velocity: 0,
                start_tick: 0,
                end_tick: 480,
                start: 0.0,
                duration: 0.5,
            },
        ];
        let events = flatten_resolved(&notes, 120.0);
        assert_eq!(events[0].midi, 60);
        assert_eq!(events[0].id, "m2");
        assert_eq!(events[0].velocity, 0.0);
        assert_eq!(events[1].start_beat, 1.0);
        assert_eq!(events[1].duration_beats, 1.0);
        assert_eq!(events[1].velocity, 1.0);
    }
}
