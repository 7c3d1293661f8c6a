//! MusicXML tree walk
//!
//! Partwise and timewise documents are first gathered into measure
//! slots (one slot per measure position, holding each part's content
//! for that measure), then walked slot by slot with per-part state.

use std::collections::HashMap;

use roxmltree::{Document as XmlDocument, Node};

use crate::diagnostics::{Diagnostics, ParseIssue, ParseOutcome};
use crate::models::elements::{clamp_midi, clamp_velocity, DEFAULT_VELOCITY};
use crate::models::{BarlineType, Chord, Clef, Element, ElementIds, Header, Measure, Mom, Note, Rest, VoiceDef};

use super::tables::{dynamics_velocity, key_name, pitch_to_midi};

/// Beats assumed for a note with no `<duration>`
pub const DEFAULT_NOTE_BEATS: f64 = 0.25;

/// Divisions per quarter until an `<attributes><divisions>` says otherwise
const DEFAULT_DIVISIONS: f64 = 1.0;

/// Parse a MusicXML document into a MOM.
///
/// A document that is not well-formed, or whose root is neither
/// `<score-partwise>` nor `<score-timewise>`, yields an empty MOM and a
/// structural error. Markup input never produces directives.
pub fn parse_musicxml(xml: &str) -> ParseOutcome {
    let mut diagnostics = Diagnostics::default();

    let doc = match XmlDocument::parse(xml) {
        Ok(doc) => doc,
        Err(e) => {
            diagnostics.report(ParseIssue::InvalidDocument { reason: e.to_string() });
            return diagnostics.finish(Mom::default(), Vec::new());
        }
    };

    let root = doc.root_element();
    let slots = match root.tag_name().name() {
        "score-partwise" => partwise_slots(root),
        "score-timewise" => timewise_slots(root),
        other => {
            diagnostics.report(ParseIssue::MissingRoot { found: other.to_string() });
            return diagnostics.finish(Mom::default(), Vec::new());
        }
    };

    let mut walker = Walker {
        header: read_header(root),
        diagnostics,
        ids: ElementIds::default(),
        parts: HashMap::new(),
    };

    let mut measures = Vec::with_capacity(slots.len());
    let mut start = 0.0;
    for (index, slot) in slots.iter().enumerate() {
        let measure = walker.measure(index as u32 + 1, start, slot);
        start += measure.duration;
        measures.push(measure);
    }

    log::info!(
        "parsed MusicXML '{}': {} parts, {} measures",
        walker.header.title,
        walker.header.voices.len(),
        measures.len()
    );
    let mom = Mom::new(walker.header, measures);
    walker.diagnostics.finish(mom, Vec::new())
}

/// One part's content for one measure position
type Slot<'a, 'input> = Vec<(&'a str, Node<'a, 'input>)>;

fn elements_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.is_element() && n.tag_name().name() == name)
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name).and_then(|n| n.text()).map(str::trim)
}

/// 1-based source line of a node, for diagnostics
fn line_of(node: Node) -> usize {
    node.document().text_pos_at(node.range().start).row as usize
}

fn partwise_slots<'a, 'input>(root: Node<'a, 'input>) -> Vec<Slot<'a, 'input>> {
    let mut slots: Vec<Slot> = Vec::new();
    for part in elements_named(root, "part") {
        let id = part.attribute("id").unwrap_or("P1");
        for (index, measure) in elements_named(part, "measure").enumerate() {
            if slots.len() <= index {
                slots.push(Vec::new());
            }
            slots[index].push((id, measure));
        }
    }
    slots
}

fn timewise_slots<'a, 'input>(root: Node<'a, 'input>) -> Vec<Slot<'a, 'input>> {
    elements_named(root, "measure")
        .map(|measure| {
            elements_named(measure, "part")
                .map(|part| (part.attribute("id").unwrap_or("P1"), part))
                .collect()
        })
        .collect()
}

fn read_header(root: Node) -> Header {
    let mut header = Header::default();

    let work_title = child(root, "work").and_then(|work| child_text(work, "work-title"));
    if let Some(title) = work_title.or_else(|| child_text(root, "movement-title")).filter(|t| !t.is_empty()) {
        header.title = title.to_string();
    }

    header.composer = child(root, "identification")
        .into_iter()
        .flat_map(|identification| elements_named(identification, "creator"))
        .find(|creator| creator.attribute("type") == Some("composer"))
        .and_then(|creator| creator.text())
        .map(|text| text.trim().to_string());

    if let Some(time) = root.descendants().find(|n| n.has_tag_name("time")) {
        let beats = child_text(time, "beats").unwrap_or("4");
        let beat_type = child_text(time, "beat-type").unwrap_or("4");
        header.meter = format!("{}/{}", beats, beat_type);
    }

    if let Some(key) = root.descendants().find(|n| n.has_tag_name("key")) {
        let fifths = child_text(key, "fifths").and_then(|f| f.parse::<i32>().ok()).unwrap_or(0);
        header.key = key_name(fifths, child_text(key, "mode")).to_string();
    }

    header.tempo = root
        .descendants()
        .filter(|n| n.has_tag_name("sound"))
        .find_map(|sound| sound.attribute("tempo"))
        .map(|tempo| tempo.trim().to_string());

    if let Some(part_list) = child(root, "part-list") {
        for score_part in elements_named(part_list, "score-part") {
            let Some(id) = score_part.attribute("id") else {
                continue;
            };
            let mut voice = VoiceDef::new(id);
            voice.name = child_text(score_part, "part-name").map(str::to_string);
            voice.short_name = child_text(score_part, "part-abbreviation").map(str::to_string);
            header.voices.push(voice);
        }
    }

    header
}

/// State carried across measures for one part
struct PartState {
    divisions: f64,
    /// Velocity from the most recent `<direction>` dynamics
    dynamics: Option<f64>,
    clef_seen: bool,
}

impl Default for PartState {
    fn default() -> Self {
        Self { divisions: DEFAULT_DIVISIONS, dynamics: None, clef_seen: false }
    }
}

struct Walker {
    header: Header,
    diagnostics: Diagnostics,
    ids: ElementIds,
    parts: HashMap<String, PartState>,
}

impl Walker {
    fn measure(&mut self, number: u32, start: f64, slot: &Slot) -> Measure {
        let mut measure = Measure::new(number, start);
        let mut longest: f64 = 0.0;

        for (part_index, (part_id, node)) in slot.iter().enumerate() {
            let (elements, cursor) = self.part_measure(part_id, *node, number, start);
            longest = longest.max(cursor);
            measure.elements.extend(elements);

            if part_index == 0 {
                measure.barline = elements_named(*node, "barline")
                    .filter_map(|barline| {
                        let style = child_text(barline, "bar-style");
                        let repeat = child(barline, "repeat").and_then(|r| r.attribute("direction"));
                        BarlineType::from_markup(style, repeat)
                    })
                    .last();
            }
        }

        // Parts restart at the measure start; merge them in time order
        measure.elements.sort_by(|a, b| a.start().total_cmp(&b.start()));
        measure.duration = longest;
        measure
    }

    /// Walk one part's content for one measure.
    ///
    /// Returns the part's elements and how far its cursor advanced.
    fn part_measure(&mut self, part_id: &str, node: Node, number: u32, measure_start: f64) -> (Vec<Element>, f64) {
        let mut elements: Vec<Element> = Vec::new();
        let mut cursor = 0.0;
        self.header.ensure_voice(part_id);

        for child_node in node.children().filter(|n| n.is_element()) {
            match child_node.tag_name().name() {
                "attributes" => self.attributes(part_id, child_node),
                "direction" => {
                    let marking = child_node
                        .descendants()
                        .filter(|n| n.has_tag_name("dynamics"))
                        .find_map(dynamics_marking);
                    if let Some(velocity) = marking {
                        self.part(part_id).dynamics = Some(velocity);
                    }
                }
                "note" => {
                    self.note(part_id, child_node, number, measure_start, &mut cursor, &mut elements);
                }
                "backup" | "forward" => {
                    log::debug!("measure {}: ignoring <{}>", number, child_node.tag_name().name());
                }
                _ => {}
            }
        }

        (elements, cursor)
    }

    fn part(&mut self, part_id: &str) -> &mut PartState {
        self.parts.entry(part_id.to_string()).or_default()
    }

    fn attributes(&mut self, part_id: &str, node: Node) {
        if let Some(text) = child_text(node, "divisions") {
            match text.parse::<f64>() {
                Ok(divisions) if divisions.is_finite() && divisions > 0.0 => self.part(part_id).divisions = divisions,
                _ => self.diagnostics.report(ParseIssue::MalformedValue {
                    line: line_of(node),
                    field: "divisions".to_string(),
                    value: text.to_string(),
                }),
            }
        }

        if let Some(clef) = child(node, "clef") {
            if !self.part(part_id).clef_seen {
                self.part(part_id).clef_seen = true;
                let sign = child_text(clef, "sign").unwrap_or("G");
                let line = child_text(clef, "line").and_then(|l| l.parse::<u8>().ok());
                self.header.ensure_voice(part_id).clef = Clef::from_sign(sign, line);
            }
        }
    }

    fn note(
        &mut self,
        part_id: &str,
        node: Node,
        number: u32,
        measure_start: f64,
        cursor: &mut f64,
        elements: &mut Vec<Element>,
    ) {
        if child(node, "grace").is_some() {
            log::debug!("measure {}: skipping grace note", number);
            return;
        }

        let beats = self.duration_beats(part_id, node, number);

        let is_chord = child(node, "chord").is_some();
        let start = if is_chord {
            elements.last().map(Element::start).unwrap_or(measure_start + *cursor)
        } else {
            let start = measure_start + *cursor;
            *cursor += beats;
            start
        };

        if child(node, "rest").is_some() {
            elements.push(Element::Rest(Rest {
                id: self.ids.rest(),
                duration: beats,
                start,
                voice: part_id.to_string(),
                measure: number,
            }));
            return;
        }

        let Some(midi) = self.pitch(node, number) else {
            return;
        };

        let own_dynamics = child(node, "notations")
            .and_then(|notations| child(notations, "dynamics"))
            .and_then(dynamics_marking);
        let velocity = own_dynamics.or(self.part(part_id).dynamics).unwrap_or(DEFAULT_VELOCITY);
        let (velocity, _) = clamp_velocity(velocity);

        let note = Note::new(self.ids.note(), midi, beats, start, velocity, part_id, number);

        if !is_chord {
            elements.push(Element::Note(note));
            return;
        }
        match elements.pop() {
            Some(Element::Note(previous)) => {
                let mut chord = Chord::from_note(previous);
                chord.notes.push(note);
                elements.push(Element::Chord(chord));
            }
            Some(Element::Chord(mut chord)) => {
                chord.notes.push(note);
                elements.push(Element::Chord(chord));
            }
            Some(other) => {
                elements.push(other);
                elements.push(Element::Note(note));
            }
            None => elements.push(Element::Note(note)),
        }
    }

    /// Beats of a `<note>`'s `<duration>`.
    ///
    /// A missing duration gives the default. One that does not parse, or
    /// that is not a positive finite number of beats, is reported and
    /// replaced by the default.
    fn duration_beats(&mut self, part_id: &str, node: Node, number: u32) -> f64 {
        let Some(text) = child_text(node, "duration") else {
            return DEFAULT_NOTE_BEATS;
        };
        let divisions = self.part(part_id).divisions;
        match text.parse::<f64>() {
            Ok(ticks) => {
                let beats = ticks / divisions;
                if beats.is_finite() && beats > 0.0 {
                    return beats;
                }
                self.diagnostics.clamped(format!("measure {}: duration", number), beats, DEFAULT_NOTE_BEATS);
            }
            Err(_) => self.diagnostics.report(ParseIssue::MalformedValue {
                line: line_of(node),
                field: "duration".to_string(),
                value: text.to_string(),
            }),
        }
        DEFAULT_NOTE_BEATS
    }

    /// MIDI number of a `<note>`'s `<pitch>` (or `<unpitched>` display pitch)
    fn pitch(&mut self, node: Node, number: u32) -> Option<i32> {
        let (pitch, step_tag, octave_tag) = match child(node, "pitch") {
            Some(pitch) => (pitch, "step", "octave"),
            None => (child(node, "unpitched")?, "display-step", "display-octave"),
        };

        let step = child_text(pitch, step_tag).unwrap_or("");
        let alter = child_text(pitch, "alter").and_then(|a| a.parse::<f64>().ok()).unwrap_or(0.0);
        let octave = child_text(pitch, octave_tag).and_then(|o| o.parse::<i32>().ok()).unwrap_or(4);

        let Some(raw) = pitch_to_midi(step, alter.round() as i32, octave) else {
            self.diagnostics.report(ParseIssue::MalformedValue {
                line: line_of(pitch),
                field: "pitch step".to_string(),
                value: step.to_string(),
            });
            return None;
        };

        let (midi, _) = clamp_midi(raw);
        self.diagnostics.clamped(format!("measure {}: pitch {}{}", number, step, octave), raw as f64, midi as f64);
        Some(midi as i32)
    }
}

/// Velocity for the first recognized marking inside a `<dynamics>` element
fn dynamics_marking(dynamics: Node) -> Option<f64> {
    dynamics
        .children()
        .filter(|n| n.is_element())
        .find_map(|marking| dynamics_velocity(marking.tag_name().name()))
}
