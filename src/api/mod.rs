//! Browser-facing WASM API
//!
//! # Module Structure
//!
//! - `helpers`: console logging macros and serde conversions
//! - `parsers`: `parseTextNotation`, `parseMidi`, `parseMusicXml`
//! - `playback`: the process-wide playback session and its controls

pub mod helpers;
pub mod parsers;
pub mod playback;

pub use parsers::{parse_midi_js, parse_musicxml_js, parse_text_notation_js, MidiOutcome};
pub use playback::{
    is_current_generation, load_midi_playback, load_playback, pause_playback, playback_state, poll_playback,
    resume_playback, start_playback, stop_playback, PlaybackSession, PollResult,
};
