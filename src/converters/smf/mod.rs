//! Standard MIDI File (SMF) reader
//!
//! Decodes chunked SMF bytes into notes with absolute start times and
//! durations in seconds.
//!
//! # Architecture
//!
//! ```text
//! bytes
//!   ↓ [reader]     bounded cursor, big-endian ints, variable-length quantities
//!   ↓ [parse]      MThd header, MTrk chunks, running status, note pairing in ticks
//!   ↓ [tempo_map]  merged tempo events → tick-to-seconds conversion
//! Vec<ResolvedNote> sorted by start
//! ```
//!
//! Only ticks-per-quarter division is interpreted. A timecode division is
//! accepted and its low 15 bits used unchanged.

mod parse;
mod reader;
mod tempo_map;

pub use parse::{parse_smf, parse_smf_notes, ResolvedNote, SmfHeader, SmfParse};
pub use tempo_map::{TempoChange, TempoMap, DEFAULT_MICROS_PER_QUARTER};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmfError {
    #[error("missing MThd header signature")]
    MissingHeader,
    #[error("header chunk length is {0}, expected 6")]
    BadHeaderLength(u32),
    #[error("division field is zero")]
    ZeroDivision,
    #[error("unexpected end of data at byte {offset} while reading {context}")]
    Truncated { offset: usize, context: String },
    #[error("data byte at {offset} with no running status to inherit")]
    NoRunningStatus { offset: usize },
}

pub type Result<T> = std::result::Result<T, SmfError>;
