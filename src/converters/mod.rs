//! Format converters
//!
//! Parsers for the binary and markup inputs. Both converge on the same
//! MOM the text parser produces (the binary parser stops at resolved,
//! wall-clock-timed notes, which the scheduler can load directly).

pub mod musicxml;
pub mod smf;

// Re-export for convenience
pub use musicxml::parse_musicxml;
pub use smf::{parse_smf, parse_smf_notes, ResolvedNote, SmfError, SmfParse};
