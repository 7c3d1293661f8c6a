//! Score header: title, meter, key, unit length and voice definitions

use num_rational::Ratio;
use serde::{Deserialize, Serialize};

/// Title used when the source declares none
pub const DEFAULT_TITLE: &str = "Untitled";

/// Meter used when the source declares none
pub const DEFAULT_METER: &str = "4/4";

/// Key used when the source declares none
pub const DEFAULT_KEY: &str = "C";

/// Tempos outside this range, in BPM, are not honored
pub const TEMPO_RANGE_BPM: (f64, f64) = (1.0, 1000.0);

/// Default unit note length (an eighth note)
pub fn default_unit_length() -> Ratio<u32> {
    Ratio::new(1, 8)
}

/// Clef attached to a voice definition
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Clef {
    #[default]
    Treble,
    Bass,
    Alto,
    Tenor,
    Percussion,
}

impl Clef {
    /// Parse a clef name as written in text notation (`clef=bass`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "treble" | "g" | "g2" => Some(Clef::Treble),
            "bass" | "f" | "f4" => Some(Clef::Bass),
            "alto" | "c" | "c3" => Some(Clef::Alto),
            "tenor" | "c4" => Some(Clef::Tenor),
            "perc" | "percussion" => Some(Clef::Percussion),
            _ => None,
        }
    }

    /// Map a markup `<clef><sign>` value (and optional line) to a clef
    pub fn from_sign(sign: &str, line: Option<u8>) -> Self {
        match (sign, line) {
            ("F", _) => Clef::Bass,
            ("C", Some(4)) => Clef::Tenor,
            ("C", _) => Clef::Alto,
            ("percussion", _) => Clef::Percussion,
            _ => Clef::Treble,
        }
    }
}

/// One declared voice (or part)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VoiceDef {
    pub id: String,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub clef: Clef,
}

impl VoiceDef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            short_name: None,
            clef: Clef::default(),
        }
    }
}

/// Score-level metadata
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Header {
    pub title: String,
    pub composer: Option<String>,
    /// Meter as written, e.g. "3/4" or "C|"
    pub meter: String,
    /// Default unit note length used by the text duration grammar
    pub unit_length: Ratio<u32>,
    /// Tempo as written, e.g. "1/4=96" or "120"
    pub tempo: Option<String>,
    pub key: String,
    pub voices: Vec<VoiceDef>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            composer: None,
            meter: DEFAULT_METER.to_string(),
            unit_length: default_unit_length(),
            tempo: None,
            key: DEFAULT_KEY.to_string(),
            voices: Vec::new(),
        }
    }
}

impl Header {
    /// Look up a voice definition by id
    pub fn voice(&self, id: &str) -> Option<&VoiceDef> {
        self.voices.iter().find(|v| v.id == id)
    }

    /// Return the voice definition for `id`, creating an empty one if unseen
    pub fn ensure_voice(&mut self, id: &str) -> &mut VoiceDef {
        let index = match self.voices.iter().position(|v| v.id == id) {
            Some(index) => index,
            None => {
                self.voices.push(VoiceDef::new(id));
                self.voices.len() - 1
            }
        };
        &mut self.voices[index]
    }

    /// Tempo in BPM when the tempo string carries a number
    ///
    /// Accepts a bare number ("96") or the `note=bpm` form ("1/4=96").
    /// Numbers outside [`TEMPO_RANGE_BPM`] give `None`.
    pub fn tempo_bpm(&self) -> Option<f64> {
        let tempo = self.tempo.as_deref()?;
        let bpm = tempo.rsplit('=').next().unwrap_or(tempo).trim();
        bpm.parse::<f64>()
            .ok()
            .filter(|bpm| (TEMPO_RANGE_BPM.0..=TEMPO_RANGE_BPM.1).contains(bpm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_defaults() {
        let header = Header::default();
        assert_eq!(header.title, "Untitled");
        assert_eq!(header.meter, "4/4");
        assert_eq!(header.key, "C");
        assert_eq!(header.unit_length, Ratio::new(1, 8));
        assert!(header.voices.is_empty());
    }

    #[test]
    fn test_ensure_voice_creates_once() {
        let mut header = Header::default();
        header.ensure_voice("S").name = Some("Soprano".to_string());
        header.ensure_voice("S");
        header.ensure_voice("A");
        assert_eq!(header.voices.len(), 2);
        assert_eq!(header.voice("S").and_then(|v| v.name.as_deref()), Some("Soprano"));
    }

    #[test]
    fn test_tempo_bpm_forms() {
        let mut header = Header::default();
        assert_eq!(header.tempo_bpm(), None);
        header.tempo = Some("1/4=96".to_string());
        assert_eq!(header.tempo_bpm(), Some(96.0));
        header.tempo = Some("140".to_string());
        assert_eq!(header.tempo_bpm(), Some(140.0));
        header.tempo = Some("Allegro".to_string());
        assert_eq!(header.tempo_bpm(), None);
    }

    #[test]
    fn test_tempo_bpm_out_of_range() {
        let mut header = Header::default();
        for tempo in ["1e-300", "1/4=0", "-60", "1e300", "inf", "NaN"] {
            header.tempo = Some(tempo.to_string());
            assert_eq!(header.tempo_bpm(), None, "{}", tempo);
        }
        header.tempo = Some("1/4=1000".to_string());
        assert_eq!(header.tempo_bpm(), Some(1000.0));
    }

    #[test]
    fn test_clef_names() {
        assert_eq!(Clef::from_name("bass"), Some(Clef::Bass));
        assert_eq!(Clef::from_name("Treble"), Some(Clef::Treble));
        assert_eq!(Clef::from_name("banjo"), None);
        assert_eq!(Clef::from_sign("C", Some(4)), Clef::Tenor);
        assert_eq!(Clef::from_sign("G", Some(2)), Clef::Treble);
    }
}
