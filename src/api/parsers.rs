//! Parser entry points
//!
//! Every parser returns a result object; JavaScript never sees an
//! exception for bad input, only for a failed conversion.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use super::helpers::serialize;
use crate::converters::{parse_musicxml, parse_smf, SmfParse};
use crate::parse::parse_text_notation;
use crate::{wasm_info, wasm_warn};

/// Result of `parseMidi`: either the parse or the structural error
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MidiOutcome {
    pub parsed: Option<SmfParse>,
    pub error: Option<String>,
}

impl MidiOutcome {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match parse_smf(bytes) {
            Ok(parsed) => Self { parsed: Some(parsed), error: None },
            Err(e) => Self { parsed: None, error: Some(e.to_string()) },
        }
    }
}

/// Parse text notation into `{ mom, directives, errors, warnings }`
#[wasm_bindgen(js_name = parseTextNotation)]
pub fn parse_text_notation_js(text: &str) -> Result<JsValue, JsValue> {
    let outcome = parse_text_notation(text);
    wasm_info!(
        "parseTextNotation: {} measures, {} warnings",
        outcome.mom.measures.len(),
        outcome.warnings.len()
    );
    serialize(&outcome, "parseTextNotation serialization error")
}

/// Parse a Standard MIDI File into `{ parsed, error }`
#[wasm_bindgen(js_name = parseMidi)]
pub fn parse_midi_js(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let outcome = MidiOutcome::from_bytes(bytes);
    match (&outcome.parsed, &outcome.error) {
        (Some(parsed), _) => wasm_info!("parseMidi: {} notes", parsed.notes.len()),
        (None, Some(error)) => wasm_warn!("parseMidi failed: {}", error),
        (None, None) => {}
    }
    serialize(&outcome, "parseMidi serialization error")
}

/// Parse a MusicXML document into `{ mom, directives, errors, warnings }`
#[wasm_bindgen(js_name = parseMusicXml)]
pub fn parse_musicxml_js(xml: &str) -> Result<JsValue, JsValue> {
    let outcome = parse_musicxml(xml);
    if !outcome.errors.is_empty() {
        wasm_warn!("parseMusicXml: {}", outcome.errors[0]);
    }
    serialize(&outcome, "parseMusicXml serialization error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_outcome_carries_error() {
        let outcome = MidiOutcome::from_bytes(b"RIFF");
        assert!(outcome.parsed.is_none());
        assert!(outcome.error.is_some());
    }
}
