//! A1-style reference conversions shared by range parsing and the xlsx reader.

/// Converts Excel-style column letters to a 0-based column index.
/// A = 0, B = 1, ..., Z = 25, AA = 26, ...
pub(crate) fn column_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.bytes().all(|byte| byte.is_ascii_uppercase()) {
        return None;
    }
    letters
        .bytes()
        .map(|byte| (byte - b'A') as usize + 1)
        .reduce(|index, digit| index * 26 + digit)
        .map(|column| column - 1)
}

/// Converts a 1-based row number string to a 0-based row index.
pub(crate) fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse()
        .ok()
        .filter(|row| *row > 0)
        .map(|row: usize| row - 1)
}

/// Splits a cell reference like "B7" into 0-based (row, column) indexes.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let split = reference
        .bytes()
        .position(|byte| byte.is_ascii_digit())?;
    let col = column_to_index(&reference[..split])?;
    let row = row_to_index(&reference[split..])?;
    Some((row, col))
}
