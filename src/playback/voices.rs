//! Reference polyphony-limited sound engine
//!
//! Voices are tracked as time intervals. Note-ons arrive in
//! non-decreasing time order from the scheduler, so the set of voices
//! sounding at a note-on's time is everything started before it that
//! has not ended by then.

use super::engine::{EngineError, SoundEngine};
use crate::models::elements::MIDI_MAX;

#[derive(Debug, Clone, PartialEq)]
struct Voice {
    id: String,
    pitch: u8,
    started_at: f64,
    /// Release time once a note-off has been scheduled
    ends_at: Option<f64>,
}

impl Voice {
    fn sounding_at(&self, time: f64) -> bool {
        self.started_at <= time && self.ends_at.map_or(true, |end| end > time)
    }
}

/// Sound engine that enforces a voice ceiling by stealing the
/// earliest-started voice
#[derive(Debug)]
pub struct VoicePool {
    max_voices: usize,
    voices: Vec<Voice>,
    stolen: Vec<String>,
    peak: usize,
}

impl VoicePool {
    pub fn new(max_voices: usize) -> Self {
        Self {
            max_voices: max_voices.max(1),
            voices: Vec::new(),
            stolen: Vec::new(),
            peak: 0,
        }
    }

    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    /// Number of voices sounding at `time`
    pub fn sounding_at(&self, time: f64) -> usize {
        self.voices.iter().filter(|v| v.sounding_at(time)).count()
    }

    /// Largest number of voices ever sounding at once
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Ids of voices evicted to make room, oldest steal first
    pub fn stolen(&self) -> &[String] {
        &self.stolen
    }

    /// Pitches sounding at `time`, in start order
    pub fn pitches_at(&self, time: f64) -> Vec<u8> {
        self.voices.iter().filter(|v| v.sounding_at(time)).map(|v| v.pitch).collect()
    }
}

impl SoundEngine for VoicePool {
    fn note_on(&mut self, id: &str, pitch: u8, _velocity: f64, at_time: f64) -> Result<(), EngineError> {
        if pitch > MIDI_MAX {
            return Err(EngineError::InvalidPitch { id: id.to_string(), pitch });
        }
        self.voices.retain(|v| v.ends_at.map_or(true, |end| end > at_time));
        if self.voices.iter().any(|v| v.id == id) {
            return Err(EngineError::DuplicateVoice(id.to_string()));
        }

        while self.voices.len() >= self.max_voices {
            let oldest = self
                .voices
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.started_at.total_cmp(&b.started_at))
                .map(|(index, _)| index);
            let Some(index) = oldest else { break };
            let voice = self.voices.remove(index);
            log::debug!("voice ceiling {} reached, stealing '{}'", self.max_voices, voice.id);
            self.stolen.push(voice.id);
        }

        self.voices.push(Voice {
            id: id.to_string(),
            pitch,
            started_at: at_time,
            ends_at: None,
        });
        self.peak = self.peak.max(self.voices.len());
        Ok(())
    }

    fn note_off(&mut self, id: &str, at_time: f64) -> Result<(), EngineError> {
        match self.voices.iter_mut().find(|v| v.id == id) {
            Some(voice) => voice.ends_at = Some(at_time),
            // Already stolen or never started
            None => log::debug!("note-off for inactive voice '{}'", id),
        }
        Ok(())
    }

    fn stop_all_voices_immediately(&mut self) {
        self.voices.clear();
    }
}
