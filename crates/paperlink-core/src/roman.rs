//! Roman numeral decoding for meeting ordinals.
//!
//! Meeting labels number consultative meetings in Roman numerals
//! ("ATCM XXIX", "CEP IX"). Decoding is strict: only the canonical form of a
//! value in 1..=3999 is accepted, so "IIII" or "VX" are rejected rather than
//! guessed at.
//!
//! # Canonical form
//!
//! - Symbols in descending value order: M, D, C, L, X, V, I
//! - Subtractive pairs only for 4 and 9 at each decimal place: IV, IX, XL, XC, CD, CM
//! - No symbol repeated more than three times

const NUMERALS: &[(u32, &str)] = &[
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Largest value with a canonical numeral.
pub const MAX_ROMAN: u32 = 3999;

/// Encode `n` as a canonical Roman numeral.
///
/// Returns `None` for 0 and for values above [`MAX_ROMAN`].
pub fn to_roman(n: u32) -> Option<String> {
    if n == 0 || n > MAX_ROMAN {
        return None;
    }
    let mut rest = n;
    let mut out = String::new();
    for &(value, symbol) in NUMERALS {
        while rest >= value {
            out.push_str(symbol);
            rest -= value;
        }
    }
    Some(out)
}

/// Decode a canonical uppercase Roman numeral.
///
/// Returns `None` for empty input, unknown symbols, and non-canonical
/// spellings.
pub fn from_roman(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return None;
    }

    let mut total: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let value = symbol_value(bytes[i])?;
        let next = bytes.get(i + 1).and_then(|&b| symbol_value(b));
        match next {
            Some(n) if n > value => {
                total = total.checked_add(n - value)?;
                i += 2;
            }
            _ => {
                total = total.checked_add(value)?;
                i += 1;
            }
        }
    }

    // Additive parsing accepts things like "IIII" and "IC"; only keep the
    // value when re-encoding reproduces the input exactly.
    match to_roman(total) {
        Some(canonical) if canonical == s => Some(total),
        _ => None,
    }
}

fn symbol_value(b: u8) -> Option<u32> {
    match b {
        b'I' => Some(1),
        b'V' => Some(5),
        b'X' => Some(10),
        b'L' => Some(50),
        b'C' => Some(100),
        b'D' => Some(500),
        b'M' => Some(1000),
        _ => None,
    }
}
