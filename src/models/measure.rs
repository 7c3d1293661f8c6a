//! Measures: numbered, timed runs of elements

use serde::{Deserialize, Serialize};

use super::barlines::BarlineType;
use super::elements::Element;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Measure {
    /// 1-based measure number
    pub number: u32,
    /// Start time in beats
    pub start: f64,
    /// Duration in beats
    pub duration: f64,
    pub elements: Vec<Element>,
    pub barline: Option<BarlineType>,
}

impl Measure {
    /// Open an empty measure
    pub fn new(number: u32, start: f64) -> Self {
        Self {
            number,
            start,
            duration: 0.0,
            elements: Vec::new(),
            barline: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Sum of the cursor-advancing element durations
    pub fn content_duration(&self) -> f64 {
        self.elements.iter().map(Element::duration).sum()
    }

    /// Close the measure, recording its duration and barline
    pub fn finish(&mut self, barline: Option<BarlineType>) {
        self.duration = self.content_duration();
        self.barline = barline;
    }
}
