//! Data block boundary detection and extraction.

use crate::grid::Grid;
use crate::grid::Value;

/// How many leading cells of a row are checked for stop markers.
const STOP_PROBE_COLUMNS: usize = 5;
/// How many leading columns decide whether a row counts as empty.
const DATA_PROBE_COLUMNS: usize = 20;

/// Finds the exclusive end row of the data block below a header row.
///
/// Scanning starts at `header_row + 1` and covers at most
/// `max_rows_to_check` rows. The block ends before the first row whose
/// leading cells contain a stop marker, or before the first of two
/// consecutive rows with no content in their leading columns; a single
/// blank row does not terminate the block. The returned index is never
/// less than `header_row + 1`; equality means an empty block.
pub fn find_data_end_row<G>(
    grid: &G,
    header_row: usize,
    stop_markers: &[String],
    max_rows_to_check: usize,
) -> usize
where
    G: Grid + ?Sized,
{
    let mut end = header_row + 1;
    let limit = grid.height().min(header_row + 1 + max_rows_to_check);
    for row in (header_row + 1)..limit {
        if hits_stop_marker(grid, row, stop_markers) {
            break;
        }
        if count_non_empty(grid, row) > 0 {
            end = row + 1;
        } else if row + 1 >= grid.height() || count_non_empty(grid, row + 1) == 0 {
            break;
        }
    }
    end
}

/// Copies the rectangular block below the header restricted to the given
/// columns. Rows shorter than the highest column index are padded with
/// empty values, never an error.
pub fn extract_block<G>(
    grid: &G,
    header_row: usize,
    data_end_row: usize,
    column_indices: &[usize],
) -> Vec<Vec<Value>>
where
    G: Grid + ?Sized,
{
    ((header_row + 1)..data_end_row)
        .map(|row| {
            column_indices
                .iter()
                .map(|&col| grid.get(row, col).clone())
                .collect()
        })
        .collect()
}

/// Checks the first cells of a row for any stop marker as a substring.
fn hits_stop_marker<G>(grid: &G, row: usize, stop_markers: &[String]) -> bool
where
    G: Grid + ?Sized,
{
    (0..STOP_PROBE_COLUMNS).any(|col| {
        let cell = grid.get(row, col);
        if cell.is_blank() {
            return false;
        }
        let text = cell.to_string();
        let text = text.trim();
        stop_markers.iter().any(|marker| text.contains(marker.as_str()))
    })
}

/// Counts non-blank cells among the leading columns of a row.
fn count_non_empty<G>(grid: &G, row: usize) -> usize
where
    G: Grid + ?Sized,
{
    (0..DATA_PROBE_COLUMNS)
        .filter(|&col| !grid.get(row, col).is_blank())
        .count()
}
