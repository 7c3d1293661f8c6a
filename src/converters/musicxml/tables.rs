//! Fixed lookup tables: key signatures and dynamics levels

/// (major, relative minor) spellings for 0..=7 sharps
const SHARP_KEYS: [(&str, &str); 8] = [
    ("C", "Am"),
    ("G", "Em"),
    ("D", "Bm"),
    ("A", "F#m"),
    ("E", "C#m"),
    ("B", "G#m"),
    ("F#", "D#m"),
    ("C#", "A#m"),
];

/// (major, relative minor) spellings for 0..=7 flats
const FLAT_KEYS: [(&str, &str); 8] = [
    ("C", "Am"),
    ("F", "Dm"),
    ("Bb", "Gm"),
    ("Eb", "Cm"),
    ("Ab", "Fm"),
    ("Db", "Bbm"),
    ("Gb", "Ebm"),
    ("Cb", "Abm"),
];

/// Key name for a fifths count and mode; counts beyond ±7 clamp to 7
pub fn key_name(fifths: i32, mode: Option<&str>) -> &'static str {
    let index = fifths.unsigned_abs().min(7) as usize;
    let (major, minor) = if fifths >= 0 { SHARP_KEYS[index] } else { FLAT_KEYS[index] };
    match mode {
        Some("minor") => minor,
        _ => major,
    }
}

/// Dynamics markings, softest to loudest
const DYNAMICS: [&str; 8] = ["ppp", "pp", "p", "mp", "mf", "f", "ff", "fff"];

const SOFTEST_VELOCITY: f64 = 0.2;
const LOUDEST_VELOCITY: f64 = 1.0;

/// Velocity in 0.2..=1.0 for a dynamics marking name
pub fn dynamics_velocity(marking: &str) -> Option<f64> {
    let level = DYNAMICS.iter().position(|d| *d == marking)?;
    let t = level as f64 / (DYNAMICS.len() - 1) as f64;
    Some(SOFTEST_VELOCITY * (1.0 - t) + LOUDEST_VELOCITY * t)
}

/// Octaves outside this range are pulled in before computing a MIDI number
const OCTAVE_RANGE: (i32, i32) = (-2, 11);

/// Largest alteration honored, in semitones
const MAX_ALTER: i32 = 12;

/// MIDI number from step, alteration and octave (C4 = 60)
///
/// The result is not clamped to 0..=127, but octave and alteration are
/// bounded first so document values of any size cannot overflow.
pub fn pitch_to_midi(step: &str, alter: i32, octave: i32) -> Option<i32> {
    let base = match step {
        "C" => 0,
        "D" => 2,
        "E" => 4,
        "F" => 5,
        "G" => 7,
        "A" => 9,
        "B" => 11,
        _ => return None,
    };
    let alter = alter.clamp(-MAX_ALTER, MAX_ALTER);
    let octave = octave.clamp(OCTAVE_RANGE.0, OCTAVE_RANGE.1);
    Some(base + alter + (octave + 1) * 12)
}
