//! The assembled Musical Object Model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::elements::{Element, Note};
use super::header::Header;
use super::measure::Measure;

/// Position of one element inside [`Mom::measures`]
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementRef {
    pub measure: usize,
    pub element: usize,
}

/// Headers, measures and a per-voice index over the same elements
///
/// The voice index stores positions, not copies, so it always reflects
/// the measure list it was built from.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Mom {
    pub header: Header,
    pub measures: Vec<Measure>,
    /// Sum of measure durations, in beats
    pub total_duration: f64,
    voices: BTreeMap<String, Vec<ElementRef>>,
}

impl Default for Mom {
    fn default() -> Self {
        Self::new(Header::default(), Vec::new())
    }
}

impl Mom {
    /// Assemble a MOM, deriving total duration and the voice index
    pub fn new(header: Header, measures: Vec<Measure>) -> Self {
        let total_duration = measures.iter().map(|m| m.duration).sum();
        let mut voices: BTreeMap<String, Vec<ElementRef>> = BTreeMap::new();
        for (measure_index, measure) in measures.iter().enumerate() {
            for (element_index, element) in measure.elements.iter().enumerate() {
                voices
                    .entry(element.voice().to_string())
                    .or_default()
                    .push(ElementRef { measure: measure_index, element: element_index });
            }
        }
        Self { header, measures, total_duration, voices }
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    /// Voice ids that own at least one element
    pub fn voice_ids(&self) -> impl Iterator<Item = &str> {
        self.voices.keys().map(String::as_str)
    }

    /// Elements of one voice, in score order
    pub fn voice_elements<'a>(&'a self, voice: &str) -> impl Iterator<Item = &'a Element> + 'a {
        self.voices
            .get(voice)
            .into_iter()
            .flatten()
            .filter_map(|r| self.measures.get(r.measure)?.elements.get(r.element))
    }

    /// Every element in score order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.measures.iter().flat_map(|m| m.elements.iter())
    }

    /// Every sounding note, chord members included
    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.elements().flat_map(Element::notes)
    }
}
