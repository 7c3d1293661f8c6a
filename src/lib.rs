//! Notation Playback WASM Module
//!
//! Reads three notation formats into one Musical Object Model (MOM) and
//! plays it back through a tempo-synchronized lookahead scheduler.
//!
//! - [`parse`]: line-oriented text notation
//! - [`converters::smf`]: Standard MIDI Files
//! - [`converters::musicxml`]: MusicXML (partwise and timewise)
//! - [`playback`]: scheduler, sound-engine and highlighter contracts

pub mod models;
pub mod diagnostics;
pub mod parse;
pub mod converters;
pub mod playback;
pub mod api;

// Re-export commonly used types
pub use models::{BarlineType, Chord, Clef, Directive, DirectiveKind, Element, Header, Measure, Mom, Note, Rest, VoiceDef};
pub use diagnostics::{Diagnostics, ParseIssue, ParseOutcome, Severity};
pub use parse::parse_text_notation;
pub use converters::{parse_musicxml, parse_smf, parse_smf_notes, ResolvedNote, SmfError, SmfParse};
pub use playback::{PlaybackError, PlaybackState, Scheduler, SchedulerConfig};

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    init_logging();
    log::info!("Notation playback WASM module initialized");
}

#[cfg(feature = "console_log")]
fn init_logging() {
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::warn_1(&format!("logger already initialized: {}", e).into());
    }
}

#[cfg(not(feature = "console_log"))]
fn init_logging() {}
