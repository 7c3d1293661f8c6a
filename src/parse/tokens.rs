//! Body tokenizer
//!
//! A single left-to-right scan over one body line. Chord symbols and
//! decorations are captured as tokens so the grammar can discard them
//! explicitly; spacing, slurs, ties and line continuations are consumed
//! without producing anything.

use crate::models::BarlineType;

use super::duration::DurationSuffix;

/// Characters consumed silently
const SILENT: &[char] = &[' ', '\t', '(', ')', '-', '.', '~', '`', '\\'];

/// A pitched note as written: accidentals, letter, octave marks, duration
#[derive(Clone, Debug, PartialEq)]
pub struct NoteToken {
    /// Net semitone offset from `^`/`_`, reset by `=`
    pub accidental: i32,
    pub letter: char,
    /// Net octave marks: `'` up, `,` down
    pub octave_shift: i32,
    pub duration: Option<DurationSuffix>,
    /// Source spelling, for diagnostics
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Barline(BarlineType),
    Note(NoteToken),
    Rest { invisible: bool, duration: Option<DurationSuffix> },
    ChordStart,
    ChordEnd(Option<DurationSuffix>),
    /// Quoted chord symbol, e.g. `"Am7"`
    ChordSymbol(String),
    /// `!trill!` or `+fermata+`
    Decoration(String),
    /// `[K:G]` style inline field
    InlineField(String),
    /// A delimited run that never closed
    Unterminated(String),
    Unknown(char),
}

/// A token and the 1-based column it started at
#[derive(Clone, Debug, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub column: usize,
}

/// Tokenize one body line
pub fn tokenize(line: &str) -> Vec<Spanned> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let column = i + 1;

        if SILENT.contains(&c) {
            // Tuplet markers: "(3" consumes its digit
            if c == '(' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()) {
                i += 1;
            }
            i += 1;
            continue;
        }

        let (token, len) = match c {
            '|' => {
                let (barline, len) = match chars.get(i + 1) {
                    Some(']') => (BarlineType::Final, 2),
                    Some('|') => (BarlineType::Double, 2),
                    Some(':') => (BarlineType::StartRepeat, 2),
                    _ => (BarlineType::Single, 1),
                };
                (Token::Barline(barline), len)
            }
            ':' => match chars.get(i + 1) {
                Some('|') | Some(':') => (Token::Barline(BarlineType::EndRepeat), 2),
                _ => (Token::Unknown(c), 1),
            },
            '"' => read_delimited(&chars, i, '"', Token::ChordSymbol),
            '!' | '+' => read_delimited(&chars, i, c, Token::Decoration),
            '[' => {
                let inline_field = chars.get(i + 1).is_some_and(|c| c.is_ascii_alphabetic())
                    && chars.get(i + 2) == Some(&':');
                if inline_field {
                    read_delimited(&chars, i, ']', Token::InlineField)
                } else {
                    (Token::ChordStart, 1)
                }
            }
            ']' => {
                let (duration, len) = DurationSuffix::read(&chars, i + 1);
                (Token::ChordEnd(duration), 1 + len)
            }
            'z' | 'x' => {
                let (duration, len) = DurationSuffix::read(&chars, i + 1);
                (Token::Rest { invisible: c == 'x', duration }, 1 + len)
            }
            '^' | '_' | '=' | 'A'..='G' | 'a'..='g' => read_note(&chars, i),
            _ => (Token::Unknown(c), 1),
        };

        tokens.push(Spanned { token, column });
        i += len;
    }

    tokens
}

/// `chars[start]` ... `close`, capturing the inner text
fn read_delimited(
    chars: &[char],
    start: usize,
    close: char,
    make: fn(String) -> Token,
) -> (Token, usize) {
    let body = &chars[start + 1..];
    match body.iter().position(|&c| c == close) {
        Some(len) => (make(body[..len].iter().collect()), len + 2),
        None => (Token::Unterminated(chars[start..].iter().collect()), chars.len() - start),
    }
}

fn read_note(chars: &[char], start: usize) -> (Token, usize) {
    let mut i = start;
    let mut accidental = 0;

    while let Some(&c) = chars.get(i) {
        match c {
            '^' => accidental += 1,
            '_' => accidental -= 1,
            '=' => accidental = 0,
            _ => break,
        }
        i += 1;
    }

    let letter = match chars.get(i) {
        Some(&c) if matches!(c, 'A'..='G' | 'a'..='g') => c,
        // Accidentals with no pitch letter after them
        _ => return (Token::Unknown(chars[start]), i - start),
    };
    i += 1;

    let mut octave_shift = 0;
    while let Some(&c) = chars.get(i) {
        match c {
            '\'' => octave_shift += 1,
            ',' => octave_shift -= 1,
            _ => break,
        }
        i += 1;
    }

    let (duration, len) = DurationSuffix::read(chars, i);
    i += len;

    let token = NoteToken {
        accidental,
        letter,
        octave_shift,
        duration,
        text: chars[start..i].iter().collect(),
    };
    (Token::Note(token), i - start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &str) -> Vec<Token> {
        tokenize(line).into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_barline_variants() {
        assert_eq!(
            kinds("| || |: :| |]"),
            vec![
                Token::Barline(BarlineType::Single),
                Token::Barline(BarlineType::Double),
                Token::Barline(BarlineType::StartRepeat),
                Token::Barline(BarlineType::EndRepeat),
                Token::Barline(BarlineType::Final),
            ]
        );
    }

    #[test]
    fn test_note_assembly() {
        let tokens = kinds("^^f,3/2");
        assert_eq!(
            tokens,
            vec![Token::Note(NoteToken {
                accidental: 2,
                letter: 'f',
                octave_shift: -1,
                duration: Some(DurationSuffix::Ratio(3, 2)),
                text: "^^f,3/2".to_string(),
            })]
        );
    }

    #[test]
    fn test_natural_resets_accidentals() {
        match &kinds("^=B")[0] {
            Token::Note(note) => assert_eq!(note.accidental, 0),
            other => panic!("expected note, got {:?}", other),
        }
        match &kinds("=_B")[0] {
            Token::Note(note) => assert_eq!(note.accidental, -1),
            other => panic!("expected note, got {:?}", other),
        }
    }

    #[test]
    fn test_chord_symbols_and_decorations_are_captured() {
        assert_eq!(
            kinds(r#""Am"!trill!C"#),
            vec![
                Token::ChordSymbol("Am".to_string()),
                Token::Decoration("trill".to_string()),
                Token::Note(NoteToken {
                    accidental: 0,
                    letter: 'C',
                    octave_shift: 0,
                    duration: None,
                    text: "C".to_string(),
                }),
            ]
        );
    }

    #[test]
    fn test_rests_and_chords() {
        let tokens = kinds("z2 [CE]/ x");
        assert_eq!(tokens[0], Token::Rest { invisible: false, duration: Some(DurationSuffix::Multiply(2)) });
        assert_eq!(tokens[1], Token::ChordStart);
        assert_eq!(tokens[4], Token::ChordEnd(Some(DurationSuffix::Divide(2))));
        assert_eq!(tokens[5], Token::Rest { invisible: true, duration: None });
    }

    #[test]
    fn test_inline_field_and_unknowns() {
        let tokens = kinds("[K:G] & ^");
        assert_eq!(tokens[0], Token::InlineField("K:G".to_string()));
        assert_eq!(tokens[1], Token::Unknown('&'));
        assert_eq!(tokens[2], Token::Unknown('^'));
    }

    #[test]
    fn test_unterminated_decoration() {
        let tokens = tokenize("C !trill");
        assert_eq!(tokens[1].token, Token::Unterminated("!trill".to_string()));
        assert_eq!(tokens[1].column, 3);
    }

    #[test]
    fn test_columns_are_one_based() {
        let columns: Vec<usize> = tokenize("C D").into_iter().map(|s| s.column).collect();
        assert_eq!(columns, vec![1, 3]);
    }
}
