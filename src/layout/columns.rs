//! Column-letter arithmetic for A1-style cell references.
//!
//! The original sheet-writing code re-derived letter/number conversion in
//! several places; this module is the single pure implementation used by
//! ranges, plans, and the in-memory sheet.

/// Convert a column letter sequence to its 1-based index.
///
/// `"A"` is 1, `"Z"` is 26, `"AA"` is 27. Returns `None` for an empty
/// string or any character outside `A..=Z`.
pub fn letter_to_index(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut index: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        let digit = u32::from(ch).checked_sub(u32::from('A'))?.checked_add(1)?;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index)
}

/// Convert a 1-based column index to its letter sequence.
///
/// `1` is `"A"`, `26` is `"Z"`, `28` is `"AB"`. Index `0` yields an empty
/// string.
pub fn index_to_letter(index: u32) -> String {
    let mut n = index;
    let mut out = String::new();
    while n > 0 {
        n = n.saturating_sub(1);
        if let Some(ch) = char::from_u32(u32::from('A').saturating_add(n % 26)) {
            out.insert(0, ch);
        }
        n /= 26;
    }
    out
}

/// Parse a single-cell reference like `"A19"` into `(column, row)`, both 1-based.
///
/// Returns `None` for row 0, missing letters, or trailing garbage.
pub fn parse_cell(reference: &str) -> Option<(u32, u32)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    let col = letter_to_index(letters)?;
    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((col, row))
}

/// Format `(column, row)` as a single-cell reference like `"A19"`.
pub fn format_cell(col: u32, row: u32) -> String {
    format!("{}{row}", index_to_letter(col))
}
