//! Contracts the scheduler dispatches to
//!
//! A [`SoundEngine`] receives timed note-on/note-off pairs; a
//! [`Highlighter`] receives visual start/end notifications. Both are
//! owned by the caller and handed to each scheduler tick.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("voice '{0}' is already sounding")]
    DuplicateVoice(String),

    #[error("pitch {pitch} for voice '{id}' is out of range")]
    InvalidPitch { id: String, pitch: u8 },

    #[error("engine rejected '{id}': {reason}")]
    Rejected { id: String, reason: String },
}

pub trait SoundEngine {
    /// Start a voice at `at_time` (clock seconds)
    fn note_on(&mut self, id: &str, pitch: u8, velocity: f64, at_time: f64) -> Result<(), EngineError>;

    /// Release a voice at `at_time` (clock seconds)
    fn note_off(&mut self, id: &str, at_time: f64) -> Result<(), EngineError>;

    fn stop_all_voices_immediately(&mut self);
}

pub trait Highlighter {
    fn on_note_start(&mut self, id: &str);
    fn on_note_end(&mut self, id: &str);
    fn clear_all_highlights(&mut self);

    /// Called once when playback runs to its natural end
    fn on_playback_end(&mut self) {}
}

/// A dispatch recorded by [`CommandBuffer`]
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    NoteOn { id: String, pitch: u8, velocity: f64, at_time: f64 },
    #[serde(rename_all = "camelCase")]
    NoteOff { id: String, at_time: f64 },
    StopAll,
    HighlightStart { id: String },
    HighlightEnd { id: String },
    ClearHighlights,
    PlaybackEnd,
}

/// Sound engine and highlighter that records every call
///
/// The browser API drains it after each loop iteration and hands the
/// commands to JavaScript.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl SoundEngine for CommandBuffer {
    fn note_on(&mut self, id: &str, pitch: u8, velocity: f64, at_time: f64) -> Result<(), EngineError> {
        self.commands.push(Command::NoteOn { id: id.to_string(), pitch, velocity, at_time });
        Ok(())
    }

    fn note_off(&mut self, id: &str, at_time: f64) -> Result<(), EngineError> {
        self.commands.push(Command::NoteOff { id: id.to_string(), at_time });
        Ok(())
    }

    fn stop_all_voices_immediately(&mut self) {
        self.commands.push(Command::StopAll);
    }
}

impl Highlighter for CommandBuffer {
    fn on_note_start(&mut self, id: &str) {
        self.commands.push(Command::HighlightStart { id: id.to_string() });
    }

    fn on_note_end(&mut self, id: &str) {
        self.commands.push(Command::HighlightEnd { id: id.to_string() });
    }

    fn clear_all_highlights(&mut self) {
        self.commands.push(Command::ClearHighlights);
    }

    fn on_playback_end(&mut self) {
        self.commands.push(Command::PlaybackEnd);
    }
}
