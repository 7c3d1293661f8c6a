//! Tempo-synchronized playback
//!
//! A [`Scheduler`] owns one session's flattened event list and admission
//! cursor. Sound and visual output go through the [`SoundEngine`] and
//! [`Highlighter`] contracts, so the same loop drives a browser audio
//! graph, the reference [`VoicePool`], or a [`CommandBuffer`] in tests.

pub mod clock;
pub mod config;
pub mod engine;
pub mod events;
pub mod scheduler;
pub mod session;
pub mod voices;

pub use clock::{Clock, InstantClock, ManualClock};
#[cfg(target_arch = "wasm32")]
pub use clock::PerformanceClock;
pub use config::{seconds_per_beat, SchedulerConfig, DEFAULT_TEMPO_BPM};
pub use engine::{Command, CommandBuffer, EngineError, Highlighter, SoundEngine};
pub use events::{flatten, flatten_resolved, FlatEvent};
pub use scheduler::{PlaybackError, PlaybackState, Scheduler, Tick};
pub use session::next_generation;
pub use voices::VoicePool;
