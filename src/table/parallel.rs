//! Parallel (secondary) table detection and row-aligned concatenation.
//!
//! Some sheets carry a second table to the right of the main one, sharing
//! the same row range (typically a per-biller share breakdown). Its columns
//! are appended to the main block, row by row.

use crate::grid::Grid;
use crate::grid::Value;
use crate::table::TableError;

/// Largest run of empty header columns still considered part of the
/// secondary table's span.
const SECONDARY_GAP_LIMIT: usize = 2;

/// Scans the header row to the right of the main table for the start of a
/// secondary table. The first non-blank header cell at or beyond
/// `primary_end_column + min_gap` (and within the lookahead window) marks
/// its start column.
pub fn find_secondary_table_start<G>(
    grid: &G,
    header_row: usize,
    primary_end_column: usize,
    min_gap: usize,
    max_lookahead: usize,
) -> Option<usize>
where
    G: Grid + ?Sized,
{
    let lower = primary_end_column + min_gap;
    let upper = (primary_end_column + max_lookahead).min(grid.row_len(header_row));
    (lower..upper).find(|&col| !grid.get(header_row, col).is_blank())
}

/// Determines how many columns the secondary table spans, starting at
/// `start_column`. The span ends once a run of empty header columns longer
/// than the gap limit is encountered.
pub(crate) fn secondary_column_span<G>(grid: &G, header_row: usize, start_column: usize) -> usize
where
    G: Grid + ?Sized,
{
    let width = grid.row_len(header_row).saturating_sub(start_column);
    let mut span = 0;
    for offset in 0..width {
        if !grid.get(header_row, start_column + offset).is_blank() {
            span = offset + 1;
        } else if offset + 1 > span + SECONDARY_GAP_LIMIT {
            break;
        }
    }
    span
}

/// Removes trailing rows that are entirely blank. Leading and interior
/// blank rows are left alone so row positions stay aligned.
pub(crate) fn trim_trailing_blank_rows(rows: &mut Vec<Vec<Value>>) {
    while rows
        .last()
        .map(|row| row.iter().all(Value::is_blank))
        .unwrap_or(false)
    {
        rows.pop();
    }
}

/// Horizontally concatenates the main and secondary blocks, aligned by row
/// position. A row-count difference of at most one is padded with blank
/// rows at the end; anything larger is a contract violation.
pub(crate) fn concat_aligned(
    sheet: &str,
    mut primary: Vec<Vec<Value>>,
    mut secondary: Vec<Vec<Value>>,
    primary_width: usize,
    secondary_width: usize,
) -> Result<Vec<Vec<Value>>, TableError> {
    let difference = primary.len().abs_diff(secondary.len());
    if difference > 1 {
        return Err(TableError::Alignment {
            sheet: sheet.to_owned(),
            primary_rows: primary.len(),
            secondary_rows: secondary.len(),
        });
    }

    let rows = primary.len().max(secondary.len());
    primary.resize_with(rows, || vec![Value::Empty; primary_width]);
    secondary.resize_with(rows, || vec![Value::Empty; secondary_width]);

    Ok(primary
        .into_iter()
        .zip(secondary)
        .map(|(mut row, extra)| {
            row.resize(primary_width, Value::Empty);
            row.extend(extra);
            row
        })
        .collect())
}
