//! Lookahead playback scheduler
//!
//! # States
//!
//! ```text
//! idle ──start──▶ running ──pause──▶ paused
//!  ▲                │  ▲               │
//!  └──stop / end────┘  └────resume─────┘
//! ```
//!
//! `stop` is legal from any state. The loop is driven from outside:
//! the owner calls [`Scheduler::tick`] and re-arms itself for the
//! returned delay. Each tick admits every event whose start falls
//! inside the lookahead window, hands the sound engine a timed
//! note-on/note-off pair, and queues the matching highlight timers.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::clock::Clock;
use super::config::{seconds_per_beat, SchedulerConfig};
use super::engine::{Highlighter, SoundEngine};
use super::events::{flatten, flatten_resolved, FlatEvent};
use super::session::{next_generation, TimerQueue, VisualCue};
use crate::converters::ResolvedNote;
use crate::models::Mom;

/// Shortest delay handed back while waiting for the final note to end
const MIN_REARM: Duration = Duration::from_millis(1);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Running,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Running => "running",
            PlaybackState::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// An illegal state transition. The state is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("cannot start playback while {0}")]
    CannotStart(PlaybackState),

    #[error("cannot pause playback while {0}")]
    CannotPause(PlaybackState),

    #[error("cannot resume playback while {0}")]
    CannotResume(PlaybackState),
}

/// What the owner of the loop should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Call `tick` again after this delay
    Rearm(Duration),
    /// Playback reached its natural end; the scheduler is idle again
    Finished,
    /// Not running; nothing to re-arm
    Idle,
}

pub struct Scheduler<C: Clock> {
    config: SchedulerConfig,
    clock: C,
    state: PlaybackState,
    events: Vec<FlatEvent>,
    seconds_per_beat: f64,
    /// Index of the next event to admit
    cursor: usize,
    /// Clock reading that corresponds to beat 0
    origin: f64,
    paused_at: f64,
    /// Latest end among admitted events, in seconds after `origin`
    admitted_end: f64,
    generation: u64,
    timers: TimerQueue,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(config: SchedulerConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            state: PlaybackState::Idle,
            events: Vec::new(),
            seconds_per_beat: seconds_per_beat(super::config::DEFAULT_TEMPO_BPM),
            cursor: 0,
            origin: 0.0,
            paused_at: 0.0,
            admitted_end: 0.0,
            generation: next_generation(),
            timers: TimerQueue::default(),
        }
    }

    /// Load a score for playback at `bpm`, stopping any current session.
    ///
    /// Returns the new session's generation token.
    pub fn load(&mut self, mom: &Mom, bpm: f64) -> u64 {
        self.load_events(flatten(mom), bpm)
    }

    /// Load notes resolved from a binary track
    pub fn load_resolved(&mut self, notes: &[ResolvedNote], bpm: f64) -> u64 {
        self.load_events(flatten_resolved(notes, bpm), bpm)
    }

    pub fn load_events(&mut self, mut events: Vec<FlatEvent>, bpm: f64) -> u64 {
        self.reset();
        events.sort_by(|a, b| a.start_beat.total_cmp(&b.start_beat));
        self.events = events;
        self.seconds_per_beat = seconds_per_beat(bpm);
        log::info!(
            "loaded {} events at {:.1} BPM (generation {})",
            self.events.len(),
            60.0 / self.seconds_per_beat,
            self.generation
        );
        self.generation
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `token` belongs to the live session
    pub fn is_current(&self, token: u64) -> bool {
        token == self.generation
    }

    pub fn events(&self) -> &[FlatEvent] {
        &self.events
    }

    /// Number of events admitted so far
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Playback time in seconds, excluding paused intervals
    pub fn elapsed(&self) -> f64 {
        match self.state {
            PlaybackState::Idle => 0.0,
            PlaybackState::Running => self.clock.now() - self.origin,
            PlaybackState::Paused => self.paused_at - self.origin,
        }
    }

    pub fn start(&mut self) -> Result<(), PlaybackError> {
        if self.state != PlaybackState::Idle {
            return Err(PlaybackError::CannotStart(self.state));
        }
        self.origin = self.clock.now();
        self.state = PlaybackState::Running;
        log::info!("playback started ({} events)", self.events.len());
        Ok(())
    }

    /// Freeze playback. The admission cursor is kept; pending highlight
    /// timers are cancelled and the generation moves on.
    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        if self.state != PlaybackState::Running {
            return Err(PlaybackError::CannotPause(self.state));
        }
        self.paused_at = self.clock.now();
        let cancelled = self.timers.cancel_all();
        self.generation = next_generation();
        self.state = PlaybackState::Paused;
        log::info!("playback paused at event {} ({} timers cancelled)", self.cursor, cancelled);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        if self.state != PlaybackState::Paused {
            return Err(PlaybackError::CannotResume(self.state));
        }
        // Shift the origin so elapsed time skips the pause
        self.origin += self.clock.now() - self.paused_at;
        self.state = PlaybackState::Running;
        log::info!("playback resumed at event {}", self.cursor);
        Ok(())
    }

    /// Return to idle from any state, rewinding to the first event.
    ///
    /// Voices already handed to the sound engine keep sounding; the
    /// owner silences them with `stop_all_voices_immediately`.
    pub fn stop(&mut self) {
        self.reset();
        log::info!("playback stopped");
    }

    fn reset(&mut self) {
        self.timers.cancel_all();
        self.cursor = 0;
        self.admitted_end = 0.0;
        self.generation = next_generation();
        self.state = PlaybackState::Idle;
    }

    /// Run one loop iteration
    pub fn tick<E, H>(&mut self, engine: &mut E, highlighter: &mut H) -> Tick
    where
        E: SoundEngine + ?Sized,
        H: Highlighter + ?Sized,
    {
        if self.state != PlaybackState::Running {
            return Tick::Idle;
        }

        let now = self.clock.now();
        let elapsed = now - self.origin;
        let horizon = elapsed + self.config.lookahead_secs();

        while let Some(event) = self.events.get(self.cursor) {
            let start = event.start_beat * self.seconds_per_beat;
            if start > horizon {
                break;
            }
            let end = start + event.duration_beats * self.seconds_per_beat;
            let on_at = self.origin + start;
            let off_at = self.origin + end;

            if let Err(e) = engine.note_on(&event.id, event.midi, event.velocity, on_at) {
                log::warn!("dropped note-on for '{}': {}", event.id, e);
            }
            if let Err(e) = engine.note_off(&event.id, off_at) {
                log::warn!("dropped note-off for '{}': {}", event.id, e);
            }
            self.timers.schedule(on_at, self.generation, VisualCue::Start(event.id.clone()));
            self.timers.schedule(off_at, self.generation, VisualCue::End(event.id.clone()));

            self.admitted_end = self.admitted_end.max(end);
            self.cursor += 1;
        }

        self.fire_timers(now, highlighter);

        if self.cursor < self.events.len() {
            return Tick::Rearm(self.config.tick_interval());
        }

        if elapsed >= self.admitted_end {
            self.reset();
            highlighter.on_playback_end();
            log::info!("playback finished");
            return Tick::Finished;
        }

        // Everything admitted; wait for the next highlight or the final note-off
        let end_at = self.origin + self.admitted_end;
        let wake = self.timers.next_deadline().map_or(end_at, |deadline| deadline.min(end_at));
        let delay = Duration::try_from_secs_f64((wake - now).max(0.0)).unwrap_or_else(|_| self.config.tick_interval());
        Tick::Rearm(delay.max(MIN_REARM))
    }

    fn fire_timers<H: Highlighter + ?Sized>(&mut self, now: f64, highlighter: &mut H) {
        for timer in self.timers.take_due(now) {
            if timer.generation != self.generation {
                log::debug!("dropping stale timer from generation {}", timer.generation);
                continue;
            }
            match &timer.cue {
                VisualCue::Start(id) => highlighter.on_note_start(id),
                VisualCue::End(id) => highlighter.on_note_end(id),
            }
        }
    }

    /// Drive the loop until playback finishes or leaves the running
    /// state, calling `wait` with each re-arm delay.
    ///
    /// Returns the number of ticks run.
    pub fn run_until_end<E, H, W>(&mut self, engine: &mut E, highlighter: &mut H, mut wait: W) -> usize
    where
        E: SoundEngine + ?Sized,
        H: Highlighter + ?Sized,
        W: FnMut(Duration),
    {
        let mut ticks = 0;
        loop {
            ticks += 1;
            match self.tick(engine, highlighter) {
                Tick::Rearm(delay) => wait(delay),
                Tick::Finished | Tick::Idle => return ticks,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::clock::ManualClock;
    use crate::playback::engine::{Command, CommandBuffer, EngineError};

    fn event(id: &str, midi: u8, start_beat: f64) -> FlatEvent {
        FlatEvent {
            id: id.to_string(),
            midi,
            velocity: 0.8,
            start_beat,
            duration_beats: 1.0,
        }
    }

    /// Events at beats 0, 1, 2 (0.0s, 0.5s, 1.0s at 120 BPM)
    fn scheduler() -> (Scheduler<ManualClock>, ManualClock) {
        let clock = ManualClock::new(0.0);
        let mut scheduler = Scheduler::new(SchedulerConfig::default(), clock.clone());
        scheduler.load_events(vec![event("a", 60, 0.0), event("b", 62, 1.0), event("c", 64, 2.0)], 120.0);
        (scheduler, clock)
    }

    fn note_ons(commands: &[Command]) -> Vec<(String, f64)> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::NoteOn { id, at_time, .. } => Some((id.clone(), *at_time)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_dispatch_order_is_non_decreasing() {
        let (mut scheduler, clock) = scheduler();
        let mut engine = CommandBuffer::default();
        let mut highlighter = CommandBuffer::default();

        scheduler.start().unwrap();
        scheduler.run_until_end(&mut engine, &mut highlighter, |delay| clock.advance(delay.as_secs_f64()));

        let ons = note_ons(engine.commands());
        let ids: Vec<&str> = ons.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(ons.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(ons.iter().map(|(_, at)| *at).collect::<Vec<_>>(), vec![0.0, 0.5, 1.0]);

        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert_eq!(scheduler.cursor(), 0);
        assert!(clock.now() >= 1.5);
        assert_eq!(highlighter.commands().last(), Some(&Command::PlaybackEnd));
    }

    #[test]
    fn test_admission_respects_lookahead() {
        let (mut scheduler, clock) = scheduler();
        let mut engine = CommandBuffer::default();
        let mut highlighter = CommandBuffer::default();

        scheduler.start().unwrap();
        assert_eq!(scheduler.tick(&mut engine, &mut highlighter), Tick::Rearm(Duration::from_millis(25)));
        assert_eq!(scheduler.cursor(), 1);

        clock.set(0.25);
        scheduler.tick(&mut engine, &mut highlighter);
        assert_eq!(scheduler.cursor(), 1);

        clock.set(0.5);
        scheduler.tick(&mut engine, &mut highlighter);
        assert_eq!(scheduler.cursor(), 2);
    }

    #[test]
    fn test_highlights_fire_at_note_times() {
        let (mut scheduler, clock) = scheduler();
        let mut engine = CommandBuffer::default();
        let mut highlighter = CommandBuffer::default();

        scheduler.start().unwrap();
        scheduler.tick(&mut engine, &mut highlighter);
        assert_eq!(highlighter.drain(), vec![Command::HighlightStart { id: "a".to_string() }]);

        clock.set(0.5);
        scheduler.tick(&mut engine, &mut highlighter);
        assert_eq!(
            highlighter.drain(),
            vec![Command::HighlightEnd { id: "a".to_string() }, Command::HighlightStart { id: "b".to_string() }]
        );
    }

    #[test]
    fn test_pause_resume_preserves_offsets() {
        let (mut scheduler, clock) = scheduler();
        let mut engine = CommandBuffer::default();
        let mut highlighter = CommandBuffer::default();

        scheduler.start().unwrap();
        scheduler.tick(&mut engine, &mut highlighter);

        clock.set(0.25);
        scheduler.pause().unwrap();
        assert_eq!(scheduler.pending_timers(), 0);
        assert_eq!(scheduler.cursor(), 1);

        clock.set(4.25);
        assert_eq!(scheduler.tick(&mut engine, &mut highlighter), Tick::Idle);
        assert_eq!(scheduler.elapsed(), 0.25);

        scheduler.resume().unwrap();
        clock.set(4.5);
        scheduler.tick(&mut engine, &mut highlighter);
        clock.set(5.0);
        scheduler.tick(&mut engine, &mut highlighter);
        assert_eq!(scheduler.elapsed(), 1.0);

        let ons = note_ons(engine.commands());
        assert_eq!(ons, vec![("a".to_string(), 0.0), ("b".to_string(), 4.5), ("c".to_string(), 5.0)]);

        clock.set(5.5);
        assert_eq!(scheduler.tick(&mut engine, &mut highlighter), Tick::Finished);
        // The end highlight for "a" was cancelled by the pause
        assert!(!highlighter.commands().contains(&Command::HighlightEnd { id: "a".to_string() }));
    }

    #[test]
    fn test_stop_rewinds_and_cancels() {
        let (mut scheduler, clock) = scheduler();
        let mut engine = CommandBuffer::default();
        let mut highlighter = CommandBuffer::default();

        scheduler.start().unwrap();
        clock.set(0.5);
        scheduler.tick(&mut engine, &mut highlighter);
        assert_eq!(scheduler.cursor(), 2);

        scheduler.stop();
        assert_eq!(scheduler.state(), PlaybackState::Idle);
        assert_eq!(scheduler.cursor(), 0);
        assert_eq!(scheduler.pending_timers(), 0);

        engine.drain();
        scheduler.start().unwrap();
        scheduler.tick(&mut engine, &mut highlighter);
        assert_eq!(note_ons(engine.commands()), vec![("a".to_string(), 0.5)]);
    }

    #[test]
    fn test_stop_is_legal_from_every_state() {
        let (mut scheduler, _clock) = scheduler();
        scheduler.stop();
        scheduler.start().unwrap();
        scheduler.pause().unwrap();
        scheduler.stop();
        assert_eq!(scheduler.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_illegal_transitions_leave_state_unchanged() {
        let (mut scheduler, _clock) = scheduler();
        assert_eq!(scheduler.pause(), Err(PlaybackError::CannotPause(PlaybackState::Idle)));
        assert_eq!(scheduler.resume(), Err(PlaybackError::CannotResume(PlaybackState::Idle)));
        assert_eq!(scheduler.state(), PlaybackState::Idle);

        scheduler.start().unwrap();
        assert_eq!(scheduler.start(), Err(PlaybackError::CannotStart(PlaybackState::Running)));
        assert_eq!(scheduler.resume(), Err(PlaybackError::CannotResume(PlaybackState::Running)));
        assert_eq!(scheduler.state(), PlaybackState::Running);

        scheduler.pause().unwrap();
        assert_eq!(scheduler.pause(), Err(PlaybackError::CannotPause(PlaybackState::Paused)));
        assert_eq!(scheduler.start(), Err(PlaybackError::CannotStart(PlaybackState::Paused)));
        assert_eq!(scheduler.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_generation_goes_stale() {
        let (mut scheduler, _clock) = scheduler();
        let token = scheduler.generation();
        assert!(scheduler.is_current(token));

        scheduler.start().unwrap();
        assert!(scheduler.is_current(token));
        scheduler.pause().unwrap();
        assert!(!scheduler.is_current(token));

        let paused = scheduler.generation();
        let reloaded = scheduler.load_events(Vec::new(), 90.0);
        assert_ne!(paused, reloaded);
        assert!(!scheduler.is_current(paused));
        assert_eq!(scheduler.state(), PlaybackState::Idle);
    }

    struct RejectingEngine {
        accepted: Vec<String>,
    }

    impl SoundEngine for RejectingEngine {
        fn note_on(&mut self, id: &str, _pitch: u8, _velocity: f64, _at_time: f64) -> Result<(), EngineError> {
            if id == "a" {
                return Err(EngineError::Rejected { id: id.to_string(), reason: "busy".to_string() });
            }
            self.accepted.push(id.to_string());
            Ok(())
        }

        fn note_off(&mut self, _id: &str, _at_time: f64) -> Result<(), EngineError> {
            Ok(())
        }

        fn stop_all_voices_immediately(&mut self) {}
    }

    #[test]
    fn test_engine_errors_do_not_stall_admission() {
        let (mut scheduler, clock) = scheduler();
        let mut engine = RejectingEngine { accepted: Vec::new() };
        let mut highlighter = CommandBuffer::default();

        scheduler.start().unwrap();
        scheduler.run_until_end(&mut engine, &mut highlighter, |delay| clock.advance(delay.as_secs_f64()));
        assert_eq!(engine.accepted, vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_unrepresentable_wait_falls_back_to_tick_interval() {
        let clock = ManualClock::new(0.0);
        let mut scheduler = Scheduler::new(SchedulerConfig::default(), clock.clone());
        let mut long = event("a", 60, 0.0);
        long.duration_beats = 1e300;
        scheduler.load_events(vec![long], 120.0);
        let mut engine = CommandBuffer::default();
        let mut highlighter = CommandBuffer::default();

        scheduler.start().unwrap();
        assert_eq!(scheduler.tick(&mut engine, &mut highlighter), Tick::Rearm(Duration::from_millis(25)));
        clock.set(1.0);
        assert_eq!(scheduler.tick(&mut engine, &mut highlighter), Tick::Rearm(Duration::from_millis(25)));
        assert_eq!(scheduler.state(), PlaybackState::Running);
        assert_eq!(highlighter.drain(), vec![Command::HighlightStart { id: "a".to_string() }]);
    }

    #[test]
    fn test_empty_session_finishes_immediately() {
        let clock = ManualClock::new(0.0);
        let mut scheduler = Scheduler::new(SchedulerConfig::default(), clock);
        let mut buffer = CommandBuffer::default();
        let mut highlighter = CommandBuffer::default();
        scheduler.start().unwrap();
        assert_eq!(scheduler.tick(&mut buffer, &mut highlighter), Tick::Finished);
        assert_eq!(highlighter.commands(), &[Command::PlaybackEnd]);
    }

    #[test]
    fn test_load_from_mom_uses_tempo() {
        let outcome = crate::parse::parse_text_notation("X:1\nL:1/4\nK:C\nC D E|\n");
        let clock = ManualClock::new(0.0);
        let mut scheduler = Scheduler::new(SchedulerConfig::default(), clock);
        scheduler.load(&outcome.mom, 60.0);
        let starts: Vec<f64> = scheduler.events().iter().map(|e| e.start_beat).collect();
        assert_eq!(starts, vec![0.0, 0.25, 0.5]);
    }
}
