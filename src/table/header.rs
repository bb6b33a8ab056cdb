//! Header row detection and column matching.

use crate::grid::Grid;

/// Normalizes a header cell: non-breaking spaces become ordinary spaces,
/// surrounding whitespace is trimmed. Comparison stays case-sensitive.
pub(crate) fn normalize_header(text: &str) -> String {
    text.replace('\u{a0}', " ").trim().to_owned()
}

/// Finds the first row within the scan window whose cells contain the marker.
///
/// Every cell is rendered to a normalized string and compared for exact
/// equality. Returns `None` when no row matches; callers treat that as a
/// recoverable skip for the sheet.
pub fn find_header_row<G>(grid: &G, marker: &str, max_scan_rows: usize) -> Option<usize>
where
    G: Grid + ?Sized,
{
    let limit = max_scan_rows.min(grid.height());
    (0..limit).find(|&row| {
        (0..grid.row_len(row)).any(|col| {
            let cell = grid.get(row, col);
            !cell.is_empty() && normalize_header(&cell.to_string()) == marker
        })
    })
}

/// Matches canonical column names against the header row.
///
/// Keeps, in `column_spec` order, each name with an exact match among the
/// normalized header cells, recording its column index. Unmatched names are
/// silently omitted; a fully-empty result means the sheet cannot satisfy the
/// schema.
pub fn match_columns<G>(
    grid: &G,
    header_row: usize,
    column_spec: &[String],
) -> (Vec<String>, Vec<usize>)
where
    G: Grid + ?Sized,
{
    let cells: Vec<String> = (0..grid.row_len(header_row))
        .map(|col| normalize_header(&grid.get(header_row, col).to_string()))
        .collect();

    let mut headers = Vec::new();
    let mut column_indices = Vec::new();
    for name in column_spec {
        if let Some(col) = cells.iter().position(|cell| cell == name) {
            headers.push(name.to_owned());
            column_indices.push(col);
        }
    }
    (headers, column_indices)
}
