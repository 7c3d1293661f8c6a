//! Text-notation parser
//!
//! Converts line-oriented text notation (header fields, `%%` directives
//! and a body of notes, rests and barlines) into the Musical Object Model.
//!
//! # Pipeline
//!
//! ```text
//! text
//!   ↓ [headers]     field lines → Header
//!   ↓ [directives]  %% lines → Directive
//!   ↓ [tokens]      body lines → Token stream
//!   ↓ [grammar]     tokens + duration/pitch rules → Measures
//! ParseOutcome { mom, directives, errors, warnings }
//! ```

pub mod directives;
pub mod duration;
pub mod grammar;
pub mod headers;
pub mod pitch;
pub mod tokens;

// Re-export commonly used items
pub use duration::{resolve_duration, DurationSuffix};
pub use grammar::parse_text_notation;
pub use pitch::note_midi;
pub use tokens::{tokenize, NoteToken, Spanned, Token};

/// Scan `key="value"` pairs out of free text.
///
/// With `allow_bare`, unquoted `key=value` pairs (ending at whitespace)
/// are accepted too. Keys are returned as written.
pub fn scan_attributes(text: &str, allow_bare: bool) -> Vec<(String, String)> {
    let chars: Vec<char> = text.chars().collect();
    let mut pairs = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '=' {
            i += 1;
            continue;
        }

        // Walk back over the key
        let mut key_start = i;
        while key_start > 0 && is_key_char(chars[key_start - 1]) {
            key_start -= 1;
        }
        let key: String = chars[key_start..i].iter().collect();
        i += 1;
        if key.is_empty() {
            continue;
        }

        if chars.get(i) == Some(&'"') {
            let value_start = i + 1;
            let Some(len) = chars[value_start..].iter().position(|&c| c == '"') else {
                break;
            };
            pairs.push((key, chars[value_start..value_start + len].iter().collect()));
            i = value_start + len + 1;
        } else if allow_bare {
            let value_start = i;
            while i < chars.len() && !chars[i].is_whitespace() {
                i += 1;
            }
            if i > value_start {
                pairs.push((key, chars[value_start..i].iter().collect()));
            }
        }
    }

    pairs
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}
