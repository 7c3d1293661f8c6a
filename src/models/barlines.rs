//! Barline kinds recorded on finished measures

use serde::{Deserialize, Serialize};

/// Barline types closing a measure
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarlineType {
    Single,      // |
    Double,      // ||
    StartRepeat, // |:
    EndRepeat,   // :|
    Final,       // |]
}

impl BarlineType {
    /// Parse barline from its text-notation spelling
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "|" => Some(BarlineType::Single),
            "||" => Some(BarlineType::Double),
            "|:" => Some(BarlineType::StartRepeat),
            ":|" => Some(BarlineType::EndRepeat),
            "|]" => Some(BarlineType::Final),
            _ => None,
        }
    }

    /// Map a markup `<barline>` (bar-style plus optional repeat direction)
    pub fn from_markup(bar_style: Option<&str>, repeat: Option<&str>) -> Option<Self> {
        match (repeat, bar_style) {
            (Some("forward"), _) => Some(BarlineType::StartRepeat),
            (Some("backward"), _) => Some(BarlineType::EndRepeat),
            (_, Some("light-heavy")) => Some(BarlineType::Final),
            (_, Some("light-light")) => Some(BarlineType::Double),
            (_, Some("regular")) => Some(BarlineType::Single),
            _ => None,
        }
    }
}
