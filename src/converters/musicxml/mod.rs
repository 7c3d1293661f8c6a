//! MusicXML → MOM parser
//!
//! # Architecture
//!
//! ```text
//! MusicXML String
//!   ↓ [Parse with roxmltree]
//! XML DOM
//!   ↓ [Gather measure slots: partwise or timewise]
//! Vec<slot of (part id, measure content)>
//!   ↓ [Walk notes with per-part divisions and dynamics]
//! ParseOutcome (MOM, no directives)
//! ```
//!
//! Each part becomes a voice. Durations are divided by the part's
//! `<divisions>` to get beats (quarter notes).

pub mod parser;
pub mod tables;

pub use parser::{parse_musicxml, DEFAULT_NOTE_BEATS};
pub use tables::{dynamics_velocity, key_name};
