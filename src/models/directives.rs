//! Annotative directives (`%%name ...` lines)
//!
//! Directives record where they appeared but never affect timing.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Attribute key used when a directive carries no `key="value"` pairs
pub const VERBATIM_KEY: &str = "text";

/// Directive categories
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    Midi,
    Score,
    Staves,
    Page,
    Font,
    Text,
    Tempo,
    Dynamics,
    Generic,
}

static DIRECTIVE_NAMES: Lazy<HashMap<&'static str, DirectiveKind>> = Lazy::new(|| {
    HashMap::from([
        ("midi", DirectiveKind::Midi),
        ("score", DirectiveKind::Score),
        ("staves", DirectiveKind::Staves),
        ("pagewidth", DirectiveKind::Page),
        ("pageheight", DirectiveKind::Page),
        ("newpage", DirectiveKind::Page),
        ("titlefont", DirectiveKind::Font),
        ("composerfont", DirectiveKind::Font),
        ("vocalfont", DirectiveKind::Font),
        ("text", DirectiveKind::Text),
        ("center", DirectiveKind::Text),
        ("begintext", DirectiveKind::Text),
        ("tempo", DirectiveKind::Tempo),
        ("dynamics", DirectiveKind::Dynamics),
    ])
});

impl DirectiveKind {
    /// Look up a directive name; unknown names are `Generic`
    pub fn from_name(name: &str) -> Self {
        DIRECTIVE_NAMES
            .get(name.to_ascii_lowercase().as_str())
            .copied()
            .unwrap_or(DirectiveKind::Generic)
    }
}

/// A directive positioned at the measure and beat where it was read
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// Name as written after the prefix
    pub name: String,
    pub measure: u32,
    pub beat: f64,
    pub attributes: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_kind_lookup() {
        assert_eq!(DirectiveKind::from_name("MIDI"), DirectiveKind::Midi);
        assert_eq!(DirectiveKind::from_name("staves"), DirectiveKind::Staves);
        assert_eq!(DirectiveKind::from_name("frobnicate"), DirectiveKind::Generic);
    }
}
