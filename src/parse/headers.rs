//! Header field lines (`T:Title`, `L:1/8`, `V:1 clef=bass`, ...)

use num_rational::Ratio;

use crate::diagnostics::{Diagnostics, ParseIssue};
use crate::models::{Clef, Header, VoiceDef};

use super::scan_attributes;

/// Fields that are legal but carry nothing the MOM records
const IGNORED_FIELDS: &[char] = &['X', 'R', 'S', 'N', 'Z', 'B', 'D', 'F', 'G', 'H', 'I', 'O', 'P', 'W', 'w', 'r', 'U', 'm', 's'];

/// Split a field line into its letter and value (`"T: Title"` → `('T', "Title")`)
pub fn split_field(line: &str) -> Option<(char, &str)> {
    let mut chars = line.chars();
    let letter = chars.next()?;
    if !letter.is_ascii_alphabetic() || chars.next() != Some(':') {
        return None;
    }
    Some((letter, line[2..].trim()))
}

/// What a field line asks the parser to do besides updating the header
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEffect {
    None,
    /// `K:` closes the header block
    EndOfHeader,
    /// `V:` selects the voice for following body content
    SwitchVoice(String),
}

/// Apply one field line to the header
pub fn apply_field(
    header: &mut Header,
    letter: char,
    value: &str,
    line: usize,
    diagnostics: &mut Diagnostics,
) -> FieldEffect {
    match letter {
        'T' => {
            // Later T: lines are subtitles
            if header.title == crate::models::header::DEFAULT_TITLE && !value.is_empty() {
                header.title = value.to_string();
            }
        }
        'C' => header.composer = Some(value.to_string()),
        'M' => header.meter = value.to_string(),
        'Q' => header.tempo = Some(value.to_string()),
        'L' => match parse_unit_length(value) {
            Some(unit) => header.unit_length = unit,
            None => diagnostics.report(ParseIssue::MalformedValue {
                line,
                field: "unit length".to_string(),
                value: value.to_string(),
            }),
        },
        'K' => {
            let key = value.split_whitespace().next().unwrap_or("");
            if !key.is_empty() {
                header.key = key.to_string();
            }
            return FieldEffect::EndOfHeader;
        }
        'V' => {
            let definition = parse_voice_definition(value, line, diagnostics);
            let Some(definition) = definition else {
                return FieldEffect::None;
            };
            let id = definition.id.clone();
            merge_voice(header, definition);
            return FieldEffect::SwitchVoice(id);
        }
        c if IGNORED_FIELDS.contains(&c) => {
            log::debug!("line {}: ignoring field {}:", line, c);
        }
        c => diagnostics.report(ParseIssue::UnrecognizedField { line, field: c.to_string() }),
    }
    FieldEffect::None
}

/// Parse `1/8`-style unit lengths (a bare `1` means a whole note)
pub fn parse_unit_length(value: &str) -> Option<Ratio<u32>> {
    let value = value.trim();
    let (numer, denom) = match value.split_once('/') {
        Some((n, d)) => (n.trim().parse::<u32>().ok()?, d.trim().parse::<u32>().ok()?),
        None => (value.parse::<u32>().ok()?, 1),
    };
    (numer > 0 && denom > 0).then(|| Ratio::new(numer, denom))
}

/// Parse `V:` values: an id token followed by optional attributes
pub fn parse_voice_definition(value: &str, line: usize, diagnostics: &mut Diagnostics) -> Option<VoiceDef> {
    let id = value.split_whitespace().next()?;
    if id.contains('=') {
        diagnostics.report(ParseIssue::MalformedValue {
            line,
            field: "voice".to_string(),
            value: value.to_string(),
        });
        return None;
    }

    let mut voice = VoiceDef::new(id);
    for (key, attr) in scan_attributes(&value[id.len()..], true) {
        match key.to_ascii_lowercase().as_str() {
            "name" | "nm" => voice.name = Some(attr),
            "subname" | "sname" | "snm" => voice.short_name = Some(attr),
            "clef" => match Clef::from_name(&attr) {
                Some(clef) => voice.clef = clef,
                None => diagnostics.report(ParseIssue::MalformedValue {
                    line,
                    field: "clef".to_string(),
                    value: attr,
                }),
            },
            other => log::debug!("line {}: ignoring voice attribute '{}'", line, other),
        }
    }
    Some(voice)
}

/// Add a voice definition, or fold new attributes into an existing one
fn merge_voice(header: &mut Header, definition: VoiceDef) {
    let had_clef = definition.clef != Clef::default();
    let existing = header.ensure_voice(&definition.id);
    if definition.name.is_some() {
        existing.name = definition.name;
    }
    if definition.short_name.is_some() {
        existing.short_name = definition.short_name;
    }
    if had_clef {
        existing.clef = definition.clef;
    }
}
