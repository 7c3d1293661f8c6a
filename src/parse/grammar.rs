//! Text-notation driver: header block, directives and body accumulation
//!
//! Lines are classified in order:
//! 1. blank lines and `%` comments are skipped
//! 2. `%%` lines become directives, positioned at the current measure/beat
//! 3. `X:` field lines update the header (`V:` also switches voice)
//! 4. everything else is body text and is tokenized
//!
//! The header block ends at `K:` or at the first body line.

use num_rational::Ratio;

use crate::diagnostics::{Diagnostics, ParseIssue, ParseOutcome};
use crate::models::elements::{clamp_midi, DEFAULT_VELOCITY};
use crate::models::{BarlineType, Chord, Directive, Element, ElementIds, Header, Measure, Mom, Note, Rest};

use super::directives::{parse_directive, DIRECTIVE_PREFIX};
use super::duration::{resolve_duration, DurationSuffix};
use super::headers::{apply_field, split_field, FieldEffect};
use super::pitch::note_midi;
use super::tokens::{tokenize, NoteToken, Spanned, Token};

/// Voice id used until a `V:` line selects another
pub const DEFAULT_VOICE: &str = "1";

/// Parse text notation into a MOM.
///
/// Never fails: problems are reported in the outcome's `errors` and
/// `warnings`, and whatever parsed cleanly is kept.
pub fn parse_text_notation(text: &str) -> ParseOutcome {
    let mut parser = TextParser::default();

    for (index, raw) in text.lines().enumerate() {
        parser.line(index + 1, raw);
    }

    parser.finish()
}

/// Per-call parse state; nothing survives between calls
struct TextParser {
    header: Header,
    diagnostics: Diagnostics,
    directives: Vec<Directive>,
    ids: ElementIds,
    in_body: bool,
    voice: Option<String>,
    beat: f64,
    measures: Vec<Measure>,
    open: Measure,
    chord: Option<Vec<(NoteToken, usize)>>,
    /// Barline tokens seen so far, including ones that close no measure
    barlines_seen: u32,
}

impl Default for TextParser {
    fn default() -> Self {
        Self {
            header: Header::default(),
            diagnostics: Diagnostics::default(),
            directives: Vec::new(),
            ids: ElementIds::default(),
            in_body: false,
            voice: None,
            beat: 0.0,
            measures: Vec::new(),
            open: Measure::new(1, 0.0),
            chord: None,
            barlines_seen: 0,
        }
    }
}

impl TextParser {
    fn line(&mut self, line: usize, raw: &str) {
        let trimmed = raw.trim();

        if trimmed.starts_with(DIRECTIVE_PREFIX) {
            let (measure, beat) = (self.barlines_seen + 1, self.beat);
            if let Some(directive) = parse_directive(trimmed, line, measure, beat, &mut self.diagnostics) {
                log::debug!("line {}: directive {:?} at measure {}", line, directive.kind, measure);
                self.directives.push(directive);
            }
            return;
        }

        let content = strip_comment(trimmed);
        if content.is_empty() {
            return;
        }

        if let Some((letter, value)) = split_field(content) {
            if self.in_body && letter != 'V' {
                log::debug!("line {}: ignoring {}: field inside body", line, letter);
                return;
            }
            match apply_field(&mut self.header, letter, value, line, &mut self.diagnostics) {
                FieldEffect::EndOfHeader => self.in_body = true,
                FieldEffect::SwitchVoice(id) => {
                    log::debug!("line {}: switching to voice {}", line, id);
                    self.voice = Some(id);
                }
                FieldEffect::None => {}
            }
            return;
        }

        self.in_body = true;
        for spanned in tokenize(content) {
            self.token(line, spanned);
        }
        // Chords never span lines
        if self.chord.is_some() {
            self.diagnostics.report(ParseIssue::MalformedValue {
                line,
                field: "chord".to_string(),
                value: "unterminated [".to_string(),
            });
            self.close_chord(line, None);
        }
    }

    fn token(&mut self, line: usize, spanned: Spanned) {
        let Spanned { token, column } = spanned;
        match token {
            Token::Barline(barline) => {
                if self.chord.is_some() {
                    self.close_chord(line, None);
                }
                self.barline(barline);
            }
            Token::Note(note) => match self.chord.as_mut() {
                Some(members) => members.push((note, column)),
                None => self.note(line, column, note),
            },
            Token::Rest { duration, .. } => {
                if self.chord.is_some() {
                    self.diagnostics.report(ParseIssue::UnrecognizedToken {
                        line,
                        column,
                        token: "rest inside chord".to_string(),
                    });
                    return;
                }
                self.rest(line, column, duration);
            }
            Token::ChordStart => {
                if self.chord.is_some() {
                    self.close_chord(line, None);
                }
                self.chord = Some(Vec::new());
            }
            Token::ChordEnd(duration) => {
                if self.chord.is_some() {
                    self.close_chord(line, duration);
                } else {
                    self.diagnostics.report(ParseIssue::UnrecognizedToken { line, column, token: "]".to_string() });
                }
            }
            Token::ChordSymbol(symbol) => log::debug!("line {}: discarding chord symbol \"{}\"", line, symbol),
            Token::Decoration(decoration) => log::debug!("line {}: discarding decoration !{}!", line, decoration),
            Token::InlineField(field) => log::debug!("line {}: ignoring inline field [{}]", line, field),
            Token::Unterminated(text) => {
                self.diagnostics.report(ParseIssue::UnrecognizedToken { line, column, token: text });
            }
            Token::Unknown(c) => {
                self.diagnostics.report(ParseIssue::UnrecognizedToken { line, column, token: c.to_string() });
            }
        }
    }

    fn current_voice(&mut self) -> String {
        match &self.voice {
            Some(voice) => voice.clone(),
            None => {
                let voice = self
                    .header
                    .voices
                    .first()
                    .map(|v| v.id.clone())
                    .unwrap_or_else(|| DEFAULT_VOICE.to_string());
                self.voice = Some(voice.clone());
                voice
            }
        }
    }

    fn duration(&mut self, line: usize, column: usize, unit: Ratio<u32>, suffix: Option<DurationSuffix>) -> f64 {
        match resolve_duration(unit, suffix) {
            Some(duration) => duration,
            None => {
                self.diagnostics.report(ParseIssue::MalformedValue {
                    line,
                    field: format!("duration (column {})", column),
                    value: format!("{:?}", suffix),
                });
                resolve_duration(unit, None).unwrap_or(0.125)
            }
        }
    }

    fn build_note(&mut self, line: usize, column: usize, token: &NoteToken, duration: f64) -> Note {
        let raw = note_midi(token.letter, token.accidental, token.octave_shift).unwrap_or(60);
        let (midi, _) = clamp_midi(raw);
        self.diagnostics
            .clamped(format!("line {}, column {}: pitch '{}'", line, column, token.text), raw as f64, midi as f64);

        let voice = self.current_voice();
        self.header.ensure_voice(&voice);
        let id = self.ids.note();
        Note::new(id, midi as i32, duration, self.beat, DEFAULT_VELOCITY, &voice, self.open.number)
    }

    fn note(&mut self, line: usize, column: usize, token: NoteToken) {
        let duration = self.duration(line, column, self.header.unit_length, token.duration);
        let note = self.build_note(line, column, &token, duration);
        self.push(Element::Note(note), duration);
    }

    fn rest(&mut self, line: usize, column: usize, suffix: Option<DurationSuffix>) {
        let duration = self.duration(line, column, self.header.unit_length, suffix);
        let voice = self.current_voice();
        self.header.ensure_voice(&voice);
        let rest = Rest {
            id: self.ids.rest(),
            duration,
            start: self.beat,
            voice,
            measure: self.open.number,
        };
        self.push(Element::Rest(rest), duration);
    }

    /// Close an open chord; the closing suffix scales every member
    fn close_chord(&mut self, line: usize, suffix: Option<DurationSuffix>) {
        let Some(members) = self.chord.take() else {
            return;
        };
        let scale = match suffix {
            Some(suffix) => self.duration(line, 0, Ratio::from_integer(1), Some(suffix)),
            None => 1.0,
        };

        let mut notes = Vec::with_capacity(members.len());
        for (token, column) in &members {
            let duration = self.duration(line, *column, self.header.unit_length, token.duration) * scale;
            notes.push(self.build_note(line, *column, token, duration));
        }

        let mut notes = notes.into_iter();
        let Some(first) = notes.next() else {
            return;
        };
        let mut chord = Chord::from_note(first);
        chord.notes.extend(notes);
        let advance = chord.duration;
        let element = if chord.notes.len() == 1 {
            Element::Note(chord.notes.remove(0))
        } else {
            Element::Chord(chord)
        };
        self.push(element, advance);
    }

    fn push(&mut self, element: Element, advance: f64) {
        self.open.elements.push(element);
        self.beat += advance;
    }

    fn barline(&mut self, barline: BarlineType) {
        self.barlines_seen += 1;
        if self.open.is_empty() {
            // "|:" opening a line, or "|" repeated across a line break
            log::debug!("barline {:?} with empty measure {}", barline, self.open.number);
            return;
        }
        let next = Measure::new(self.open.number + 1, self.beat);
        let mut finished = std::mem::replace(&mut self.open, next);
        finished.finish(Some(barline));
        self.measures.push(finished);
    }

    fn finish(mut self) -> ParseOutcome {
        if !self.open.is_empty() {
            let mut trailing = std::mem::replace(&mut self.open, Measure::new(0, 0.0));
            trailing.finish(None);
            self.measures.push(trailing);
        }

        log::info!(
            "parsed text notation: {} measures, {} directives",
            self.measures.len(),
            self.directives.len()
        );
        let mom = Mom::new(self.header, self.measures);
        self.diagnostics.finish(mom, self.directives)
    }
}

/// Drop a trailing `%` comment from a non-directive line
fn strip_comment(line: &str) -> &str {
    match line.find('%') {
        Some(index) => line[..index].trim_end(),
        None => line,
    }
}
