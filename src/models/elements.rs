//! Timed elements: notes, rests and chords
//!
//! Times and durations are in beats. Construction goes through
//! [`Note::new`], which clamps pitch and velocity into their legal
//! ranges so nothing out of range is ever stored.

use serde::{Deserialize, Serialize};

/// Highest legal MIDI note number
pub const MIDI_MAX: u8 = 127;

/// Velocity used when the source carries no dynamics
pub const DEFAULT_VELOCITY: f64 = 0.8;

/// Clamp a computed MIDI number into 0..=127.
///
/// Returns the clamped value and whether clamping happened.
pub fn clamp_midi(value: i32) -> (u8, bool) {
    let clamped = value.clamp(0, MIDI_MAX as i32);
    (clamped as u8, clamped != value)
}

/// Clamp a velocity into 0.0..=1.0 (NaN becomes the default velocity).
///
/// Returns the clamped value and whether clamping happened.
pub fn clamp_velocity(value: f64) -> (f64, bool) {
    if value.is_nan() {
        return (DEFAULT_VELOCITY, true);
    }
    let clamped = value.clamp(0.0, 1.0);
    (clamped, clamped != value)
}

/// A pitched, sounding element
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Note {
    pub id: String,
    /// Human-readable pitch label, e.g. "C#4"
    pub pitch: String,
    pub midi: u8,
    pub duration: f64,
    pub start: f64,
    pub velocity: f64,
    pub voice: String,
    pub measure: u32,
}

impl Note {
    /// Build a note, clamping `midi` and `velocity` into range
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        midi: i32,
        duration: f64,
        start: f64,
        velocity: f64,
        voice: &str,
        measure: u32,
    ) -> Self {
        let (midi, _) = clamp_midi(midi);
        let (velocity, _) = clamp_velocity(velocity);
        Self {
            id,
            pitch: midi_label(midi),
            midi,
            duration,
            start,
            velocity,
            voice: voice.to_string(),
            measure,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A silent element
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Rest {
    pub id: String,
    pub duration: f64,
    pub start: f64,
    pub voice: String,
    pub measure: u32,
}

/// Notes sounding together from one start time
///
/// `duration` is the time the chord advances the measure cursor,
/// which is the first member's duration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Chord {
    pub start: f64,
    pub duration: f64,
    pub notes: Vec<Note>,
}

impl Chord {
    /// Start a chord from its first member
    pub fn from_note(note: Note) -> Self {
        Self {
            start: note.start,
            duration: note.duration,
            notes: vec![note],
        }
    }
}

/// One entry of a measure's element sequence
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Note(Note),
    Rest(Rest),
    Chord(Chord),
}

impl Element {
    pub fn start(&self) -> f64 {
        match self {
            Element::Note(note) => note.start,
            Element::Rest(rest) => rest.start,
            Element::Chord(chord) => chord.start,
        }
    }

    /// How far this element advances the measure cursor
    pub fn duration(&self) -> f64 {
        match self {
            Element::Note(note) => note.duration,
            Element::Rest(rest) => rest.duration,
            Element::Chord(chord) => chord.duration,
        }
    }

    /// Owning voice (a chord reports its first member's voice)
    pub fn voice(&self) -> &str {
        match self {
            Element::Note(note) => &note.voice,
            Element::Rest(rest) => &rest.voice,
            Element::Chord(chord) => chord.notes.first().map(|n| n.voice.as_str()).unwrap_or(""),
        }
    }

    /// Every sounding note carried by this element
    pub fn notes(&self) -> &[Note] {
        match self {
            Element::Note(note) => std::slice::from_ref(note),
            Element::Rest(_) => &[],
            Element::Chord(chord) => &chord.notes,
        }
    }

    /// Every id carried by this element (one per chord member)
    pub fn ids(&self) -> Vec<&str> {
        match self {
            Element::Note(note) => vec![note.id.as_str()],
            Element::Rest(rest) => vec![rest.id.as_str()],
            Element::Chord(chord) => chord.notes.iter().map(|n| n.id.as_str()).collect(),
        }
    }
}

/// Id allocator local to one parse call
#[derive(Debug, Default)]
pub struct ElementIds {
    next: u32,
}

impl ElementIds {
    pub fn note(&mut self) -> String {
        self.next += 1;
        format!("n{}", self.next)
    }

    pub fn rest(&mut self) -> String {
        self.next += 1;
        format!("r{}", self.next)
    }
}

/// Scientific pitch label for a MIDI number (60 → "C4")
pub fn midi_label(midi: u8) -> String {
    const NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    let octave = (midi / 12) as i32 - 1;
    format!("{}{}", NAMES[(midi % 12) as usize], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_clamps_out_of_range_values() {
        let note = Note::new("n1".to_string(), 140, 1.0, 0.0, 1.7, "1", 1);
        assert_eq!(note.midi, 127);
        assert_eq!(note.velocity, 1.0);

        let note = Note::new("n2".to_string(), -3, 1.0, 0.0, -0.5, "1", 1);
        assert_eq!(note.midi, 0);
        assert_eq!(note.velocity, 0.0);
    }

    #[test]
    fn test_clamp_reports_change() {
        assert_eq!(clamp_midi(60), (60, false));
        assert_eq!(clamp_midi(128), (127, true));
        assert_eq!(clamp_velocity(0.5), (0.5, false));
        assert_eq!(clamp_velocity(f64::NAN), (DEFAULT_VELOCITY, true));
    }

    #[test]
    fn test_midi_label() {
        assert_eq!(midi_label(60), "C4");
        assert_eq!(midi_label(61), "C#4");
        assert_eq!(midi_label(69), "A4");
        assert_eq!(midi_label(0), "C-1");
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids = ElementIds::default();
        let a = ids.note();
        let b = ids.rest();
        let c = ids.note();
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, "n1");
        assert_eq!(b, "r2");
    }

    #[test]
    fn test_chord_element_accessors() {
        let root = Note::new("n1".to_string(), 60, 0.5, 1.0, 0.8, "1", 1);
        let third = Note::new("n2".to_string(), 64, 0.5, 1.0, 0.8, "1", 1);
        let mut chord = Chord::from_note(root);
        chord.notes.push(third);
        let element = Element::Chord(chord);
        assert_eq!(element.start(), 1.0);
        assert_eq!(element.duration(), 0.5);
        assert_eq!(element.notes().len(), 2);
        assert_eq!(element.ids(), vec!["n1", "n2"]);
    }
}
