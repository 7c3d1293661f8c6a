//! Pitch letter → MIDI number

/// Uppercase letters sit one octave below the lowercase baseline:
/// `C` is middle C (60), `c` is 72.
const UPPER_BASE: [(char, i32); 7] = [
    ('C', 60),
    ('D', 62),
    ('E', 64),
    ('F', 65),
    ('G', 67),
    ('A', 69),
    ('B', 71),
];

/// MIDI number of a bare pitch letter, or `None` for a non-pitch character
pub fn base_midi(letter: char) -> Option<i32> {
    let upper = letter.to_ascii_uppercase();
    let (_, base) = UPPER_BASE.iter().find(|(name, _)| *name == upper)?;
    Some(if letter.is_ascii_lowercase() { base + 12 } else { *base })
}

/// Unclamped MIDI number for a letter with accidental and octave shift
///
/// `accidental` is the net semitone offset, `octave_shift` the net
/// count of octave marks (positive up, negative down).
pub fn note_midi(letter: char, accidental: i32, octave_shift: i32) -> Option<i32> {
    Some(base_midi(letter)? + accidental + 12 * octave_shift)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_case_selects_octave() {
        assert_eq!(base_midi('C'), Some(60));
        assert_eq!(base_midi('c'), Some(72));
        assert_eq!(base_midi('B'), Some(71));
        assert_eq!(base_midi('a'), Some(81));
        assert_eq!(base_midi('z'), None);
    }

    #[test]
    fn test_accidentals_and_octave_marks() {
        assert_eq!(note_midi('F', 1, 0), Some(66));
        assert_eq!(note_midi('B', -2, 0), Some(69));
        assert_eq!(note_midi('c', 0, 1), Some(84));
        assert_eq!(note_midi('C', 0, -2), Some(36));
    }
}
