//! Musical Object Model (MOM)
//!
//! The format-neutral record tree every parser populates and the
//! playback scheduler consumes: headers, measures, elements and the
//! per-voice index over them.

pub mod barlines;
pub mod directives;
pub mod elements;
pub mod header;
pub mod measure;
pub mod mom;

// Re-export commonly used types
pub use barlines::BarlineType;
pub use directives::{Directive, DirectiveKind};
pub use elements::{Chord, Element, ElementIds, Note, Rest};
pub use header::{Clef, Header, VoiceDef};
pub use measure::Measure;
pub use mom::{ElementRef, Mom};
