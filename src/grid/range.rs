use crate::grid::reference::column_to_index;
use crate::grid::reference::row_to_index;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Errors related to Excel-style range parsing.
#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),
}

/// An Excel-style cell range with optional boundaries.
///
/// All bounds are 0-based and inclusive; `None` means unbounded in that
/// direction, so `"A6:P"` constrains columns and the starting row only.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub row_lower_bound: Option<usize>,
    pub row_upper_bound: Option<usize>,
    pub col_lower_bound: Option<usize>,
    pub col_upper_bound: Option<usize>,
}

impl Range {
    /// Checks if a cell at (row, col) falls within the range bounds.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.row_lower_bound.map(|bound| bound <= row).unwrap_or(true)
            && self.row_upper_bound.map(|bound| row <= bound).unwrap_or(true)
            && self.col_lower_bound.map(|bound| bound <= col).unwrap_or(true)
            && self.col_upper_bound.map(|bound| col <= bound).unwrap_or(true)
    }

    /// Checks if a row lies beyond the upper row bound.
    pub(crate) fn after_last_row(&self, row: usize) -> bool {
        self.row_upper_bound.map(|bound| bound < row).unwrap_or(false)
    }
}

impl TryFrom<&str> for Range {
    type Error = RangeError;

    /// Parses an Excel-style range string (e.g., "A1", "B2:C5", "A:C", "6:").
    /// Supports single cells, full ranges, and partial ranges (columns or rows only).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let pattern = Regex::new(r"^([A-Z]*)(\d*)(:([A-Z]*)(\d*))?$").expect("Hardcode regex pattern");
        let value = value.to_ascii_uppercase();
        let captures = pattern
            .captures(value.as_str())
            .ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        Ok(Range {
            col_lower_bound: captures
                .get(1)
                .map(|matcher| matcher.as_str())
                .and_then(column_to_index),
            row_lower_bound: captures
                .get(2)
                .map(|matcher| matcher.as_str())
                .and_then(row_to_index),
            col_upper_bound: captures
                .get(4)
                .map(|matcher| matcher.as_str())
                .and_then(column_to_index),
            row_upper_bound: captures
                .get(5)
                .map(|matcher| matcher.as_str())
                .and_then(row_to_index),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_full() {
        let range = Range::try_from("A6:P100").unwrap();
        assert_eq!(range.col_lower_bound, Some(0));
        assert_eq!(range.row_lower_bound, Some(5));
        assert_eq!(range.col_upper_bound, Some(15));
        assert_eq!(range.row_upper_bound, Some(99));
    }

    #[test]
    fn range_partial() {
        let range = Range::try_from("A:C").unwrap();
        assert_eq!(range.col_lower_bound, Some(0));
        assert_eq!(range.col_upper_bound, Some(2));
        assert_eq!(range.row_lower_bound, None);
        assert_eq!(range.row_upper_bound, None);

        let range = Range::try_from("6:").unwrap();
        assert_eq!(range.row_lower_bound, Some(5));
        assert_eq!(range.row_upper_bound, None);
    }

    #[test]
    fn range_single_cell() {
        let range = Range::try_from("b2").unwrap();
        assert_eq!(range.col_lower_bound, Some(1));
        assert_eq!(range.row_lower_bound, Some(1));
        assert_eq!(range.col_upper_bound, None);
        assert_eq!(range.row_upper_bound, None);
    }

    #[test]
    fn range_invalid() {
        assert!(Range::try_from("A1:B2:C3").is_err());
        assert!(Range::try_from("1A").is_err());
    }

    #[test]
    fn range_contains() {
        let range = Range::try_from("A6:P100").unwrap();
        assert!(range.contains(5, 0));
        assert!(range.contains(99, 15));
        assert!(!range.contains(4, 0));
        assert!(!range.contains(5, 16));

        assert!(Range::default().contains(0, 0));
        assert!(Range::default().contains(10_000, 10_000));
    }
}
