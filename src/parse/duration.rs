//! Duration suffix grammar
//!
//! Three mutually exclusive forms, tried in this order:
//!
//! | suffix | meaning                 |
//! |--------|-------------------------|
//! | `3/2`  | ratio 3/2 of the unit   |
//! | `/4`   | unit divided by 4       |
//! | `/`    | unit divided by 2       |
//! | `2`    | unit multiplied by 2    |
//!
//! A ratio with a missing denominator (`3/`) uses the default divisor 2.

use num_rational::Ratio;
use serde::{Deserialize, Serialize};

/// Divisor used by a bare `/`
pub const DEFAULT_DIVISOR: u32 = 2;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DurationSuffix {
    Multiply(u32),
    Divide(u32),
    Ratio(u32, u32),
}

impl DurationSuffix {
    /// Read a suffix starting at `chars[pos]`.
    ///
    /// Returns the suffix (if any) and the number of characters consumed.
    pub fn read(chars: &[char], pos: usize) -> (Option<Self>, usize) {
        let (leading, leading_len) = read_digits(chars, pos);
        let slash = chars.get(pos + leading_len) == Some(&'/');

        match (leading, slash) {
            (Some(numer), true) => {
                let (denom, denom_len) = read_digits(chars, pos + leading_len + 1);
                let denom = denom.unwrap_or(DEFAULT_DIVISOR);
                (Some(DurationSuffix::Ratio(numer, denom)), leading_len + 1 + denom_len)
            }
            (None, true) => {
                let (divisor, divisor_len) = read_digits(chars, pos + 1);
                let divisor = divisor.unwrap_or(DEFAULT_DIVISOR);
                (Some(DurationSuffix::Divide(divisor)), 1 + divisor_len)
            }
            (Some(factor), false) => (Some(DurationSuffix::Multiply(factor)), leading_len),
            (None, false) => (None, 0),
        }
    }

    /// The suffix as a ratio of the unit length, or `None` when it
    /// would produce a zero or undefined duration
    pub fn factor(self) -> Option<Ratio<u32>> {
        let (numer, denom) = match self {
            DurationSuffix::Multiply(n) => (n, 1),
            DurationSuffix::Divide(d) => (1, d),
            DurationSuffix::Ratio(n, d) => (n, d),
        };
        (numer > 0 && denom > 0).then(|| Ratio::new(numer, denom))
    }
}

fn read_digits(chars: &[char], pos: usize) -> (Option<u32>, usize) {
    let len = chars[pos.min(chars.len())..]
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .count();
    if len == 0 {
        return (None, 0);
    }
    let digits: String = chars[pos..pos + len].iter().collect();
    // Absurdly long digit runs saturate rather than fail
    (Some(digits.parse().unwrap_or(u32::MAX)), len)
}

/// Resolve a duration against the unit length.
///
/// `None` means "no suffix", i.e. exactly one unit. A suffix that
/// resolves to zero (`C0`, `C/0`) also yields `None` so the caller can
/// report it and fall back to one unit.
pub fn resolve_duration(unit: Ratio<u32>, suffix: Option<DurationSuffix>) -> Option<f64> {
    let factor = match suffix {
        Some(suffix) => suffix.factor()?,
        None => Ratio::from_integer(1),
    };
    Some(ratio_to_f64(unit) * ratio_to_f64(factor))
}

pub fn ratio_to_f64(ratio: Ratio<u32>) -> f64 {
    *ratio.numer() as f64 / *ratio.denom() as f64
}
