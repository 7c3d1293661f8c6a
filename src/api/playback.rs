//! Process-wide playback session for the browser
//!
//! One scheduler lives behind a mutex. Its sound and visual output is
//! recorded into command buffers that JavaScript drains: `pollPlayback`
//! runs one loop iteration and returns the commands it produced, tagged
//! with the session generation so late callbacks can detect staleness.

use std::sync::Mutex;

use lazy_static::lazy_static;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use super::helpers::{deserialize, deserialize_or_default, js_error, serialize};
use crate::converters::parse_smf;
use crate::models::Mom;
use crate::playback::{
    Command, CommandBuffer, Highlighter, PlaybackError, PlaybackState, Scheduler, SchedulerConfig, SoundEngine,
    Tick, DEFAULT_TEMPO_BPM,
};
use crate::{wasm_info, wasm_log};

#[cfg(target_arch = "wasm32")]
type SessionClock = crate::playback::PerformanceClock;
#[cfg(not(target_arch = "wasm32"))]
type SessionClock = crate::playback::InstantClock;

pub struct PlaybackSession {
    scheduler: Scheduler<SessionClock>,
    sound: CommandBuffer,
    visual: CommandBuffer,
}

/// What one poll hands back to JavaScript
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PollResult {
    pub generation: u64,
    pub state: PlaybackState,
    /// Delay before the next poll; absent once playback is not running
    pub rearm_ms: Option<f64>,
    pub finished: bool,
    pub commands: Vec<Command>,
}

impl PlaybackSession {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            scheduler: Scheduler::new(config, SessionClock::default()),
            sound: CommandBuffer::default(),
            visual: CommandBuffer::default(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler<SessionClock> {
        &self.scheduler
    }

    pub fn load_mom(&mut self, mom: &Mom, bpm: Option<f64>) -> u64 {
        let bpm = bpm.or_else(|| mom.header.tempo_bpm()).unwrap_or(DEFAULT_TEMPO_BPM);
        self.scheduler.load(mom, bpm)
    }

    pub fn start(&mut self) -> Result<(), PlaybackError> {
        self.scheduler.start()
    }

    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        self.scheduler.resume()
    }

    /// Pause and silence; returns the silencing commands
    pub fn pause(&mut self) -> Result<Vec<Command>, PlaybackError> {
        self.scheduler.pause()?;
        Ok(self.silence())
    }

    /// Stop and silence; returns the silencing commands
    pub fn stop(&mut self) -> Vec<Command> {
        self.scheduler.stop();
        self.silence()
    }

    fn silence(&mut self) -> Vec<Command> {
        self.sound.stop_all_voices_immediately();
        self.visual.clear_all_highlights();
        self.drain()
    }

    pub fn poll(&mut self) -> PollResult {
        let tick = self.scheduler.tick(&mut self.sound, &mut self.visual);
        let rearm_ms = match tick {
            Tick::Rearm(delay) => Some(delay.as_secs_f64() * 1000.0),
            Tick::Finished | Tick::Idle => None,
        };
        PollResult {
            generation: self.scheduler.generation(),
            state: self.scheduler.state(),
            rearm_ms,
            finished: tick == Tick::Finished,
            commands: self.drain(),
        }
    }

    fn drain(&mut self) -> Vec<Command> {
        let mut commands = self.sound.drain();
        commands.extend(self.visual.drain());
        commands
    }
}

lazy_static! {
    static ref SESSION: Mutex<Option<PlaybackSession>> = Mutex::new(None);
}

/// Run `f` against the loaded session
fn with_session<T>(f: impl FnOnce(&mut PlaybackSession) -> Result<T, JsValue>) -> Result<T, JsValue> {
    let mut guard = SESSION.lock().map_err(|_| js_error("playback session lock poisoned"))?;
    match guard.as_mut() {
        Some(session) => f(session),
        None => Err(js_error("no playback loaded")),
    }
}

fn transition_error(e: PlaybackError) -> JsValue {
    js_error(e.to_string())
}

fn install(config: SchedulerConfig, load: impl FnOnce(&mut PlaybackSession) -> u64) -> Result<f64, JsValue> {
    let mut guard = SESSION.lock().map_err(|_| js_error("playback session lock poisoned"))?;
    let session = guard.insert(PlaybackSession::new(config));
    let generation = load(session);
    wasm_info!("playback loaded: {} events, generation {}", session.scheduler.events().len(), generation);
    Ok(generation as f64)
}

/// Load a MOM for playback, replacing any previous session.
///
/// `bpm` falls back to the MOM's tempo header, then 120. `config` is an
/// optional partial `SchedulerConfig`. Returns the generation token.
#[wasm_bindgen(js_name = loadPlayback)]
pub fn load_playback(mom_js: JsValue, bpm: Option<f64>, config_js: JsValue) -> Result<f64, JsValue> {
    let mom: Mom = deserialize(mom_js, "loadPlayback: invalid MOM")?;
    let config: SchedulerConfig = deserialize_or_default(config_js, "loadPlayback: invalid config")?;
    install(config, |session| session.load_mom(&mom, bpm))
}

/// Load a Standard MIDI File for playback at its initial tempo
#[wasm_bindgen(js_name = loadMidiPlayback)]
pub fn load_midi_playback(bytes: &[u8], config_js: JsValue) -> Result<f64, JsValue> {
    let parsed = parse_smf(bytes).map_err(|e| js_error(format!("loadMidiPlayback: {}", e)))?;
    let config: SchedulerConfig = deserialize_or_default(config_js, "loadMidiPlayback: invalid config")?;
    let bpm = parsed.tempo_map.initial_bpm();
    install(config, |session| session.scheduler.load_resolved(&parsed.notes, bpm))
}

#[wasm_bindgen(js_name = startPlayback)]
pub fn start_playback() -> Result<(), JsValue> {
    with_session(|session| session.start().map_err(transition_error))
}

/// Pause; returns the commands that silence sound and highlights
#[wasm_bindgen(js_name = pausePlayback)]
pub fn pause_playback() -> Result<JsValue, JsValue> {
    with_session(|session| {
        let commands = session.pause().map_err(transition_error)?;
        serialize(&commands, "pausePlayback serialization error")
    })
}

#[wasm_bindgen(js_name = resumePlayback)]
pub fn resume_playback() -> Result<(), JsValue> {
    with_session(|session| session.resume().map_err(transition_error))
}

/// Stop; returns the commands that silence sound and highlights
#[wasm_bindgen(js_name = stopPlayback)]
pub fn stop_playback() -> Result<JsValue, JsValue> {
    with_session(|session| serialize(&session.stop(), "stopPlayback serialization error"))
}

/// Run one scheduling loop iteration
#[wasm_bindgen(js_name = pollPlayback)]
pub fn poll_playback() -> Result<JsValue, JsValue> {
    with_session(|session| {
        let result = session.poll();
        if result.finished {
            wasm_log!("playback finished, generation {}", result.generation);
        }
        serialize(&result, "pollPlayback serialization error")
    })
}

/// Whether a token handed out earlier still belongs to the live session
#[wasm_bindgen(js_name = isCurrentGeneration)]
pub fn is_current_generation(token: f64) -> bool {
    match SESSION.lock() {
        Ok(guard) => guard
            .as_ref()
            .map_or(false, |session| session.scheduler.is_current(token as u64)),
        Err(_) => false,
    }
}

#[wasm_bindgen(js_name = playbackState)]
pub fn playback_state() -> String {
    match SESSION.lock() {
        Ok(guard) => guard
            .as_ref()
            .map_or(PlaybackState::Idle, |session| session.scheduler.state())
            .to_string(),
        Err(_) => PlaybackState::Idle.to_string(),
    }
}
