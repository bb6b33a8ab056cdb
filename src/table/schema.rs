//! Canonical column schemas: externally supplied or inferred from the
//! sheets themselves.

use crate::grid::Grid;
use crate::grid::Value;
use crate::table::header::find_header_row;
use crate::table::header::normalize_header;
use serde::Deserialize;
use serde::Serialize;
use std::collections::HashMap;

/// The ordered list of canonical column names every sheet is normalized
/// onto.
///
/// A schema is an immutable value computed (or supplied) once and passed to
/// every extraction call; nothing mutates it afterwards, so parallel
/// per-sheet extraction needs no synchronization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SchemaSpec {
    /// Externally supplied columns of interest; sheet headers not in the
    /// list are dropped.
    Fixed(Vec<String>),
    /// Canonical columns inferred from the widest header row in the batch;
    /// each sheet is re-indexed onto them.
    Inferred(Vec<String>),
}

impl SchemaSpec {
    /// Builds a fixed schema from canonical column names.
    pub fn fixed<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SchemaSpec::Fixed(names.into_iter().map(Into::into).collect())
    }

    /// The canonical column names in order.
    pub fn columns(&self) -> &[String] {
        match self {
            SchemaSpec::Fixed(columns) | SchemaSpec::Inferred(columns) => columns,
        }
    }

    /// Infers a canonical schema from a batch of grids: the header row with
    /// the most non-empty entries wins, duplicates suffixed with `_N`.
    /// Returns `None` when no grid contains a header row.
    pub fn infer<G>(grids: &[G], marker: &str, max_scan_rows: usize) -> Option<SchemaSpec>
    where
        G: Grid,
    {
        grids
            .iter()
            .filter_map(|grid| {
                let header_row = find_header_row(grid, marker, max_scan_rows)?;
                let headers: Vec<String> = collect_headers(grid, header_row)
                    .into_iter()
                    .map(|(name, _)| name)
                    .collect();
                Some(headers)
            })
            .max_by_key(Vec::len)
            .filter(|headers| !headers.is_empty())
            .map(SchemaSpec::Inferred)
    }
}

/// Reads the non-blank header cells of a row as (name, column index) pairs,
/// normalized and deduplicated in place.
pub(crate) fn collect_headers<G>(grid: &G, header_row: usize) -> Vec<(String, usize)>
where
    G: Grid + ?Sized,
{
    let mut names = Vec::new();
    let mut columns = Vec::new();
    for col in 0..grid.row_len(header_row) {
        let cell = grid.get(header_row, col);
        if !cell.is_blank() {
            names.push(normalize_header(&cell.to_string()));
            columns.push(col);
        }
    }
    dedupe_headers(names).into_iter().zip(columns).collect()
}

/// Makes header names unique by suffixing repeats with `_1`, `_2`, ...
pub(crate) fn dedupe_headers(names: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| match seen.get_mut(&name) {
            Some(count) => {
                *count += 1;
                format!("{name}_{count}")
            }
            None => {
                seen.insert(name.to_owned(), 0);
                name
            }
        })
        .collect()
}

/// Re-indexes rows from one header layout onto the canonical schema:
/// missing columns become empty values, extra columns are dropped.
pub(crate) fn reindex(
    rows: Vec<Vec<Value>>,
    headers: &[String],
    schema: &[String],
) -> Vec<Vec<Value>> {
    let mapping: Vec<Option<usize>> = schema
        .iter()
        .map(|name| headers.iter().position(|header| header == name))
        .collect();
    rows.into_iter()
        .map(|row| {
            mapping
                .iter()
                .map(|source| {
                    source
                        .and_then(|index| row.get(index).cloned())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SheetGrid;
    use pretty_assertions::assert_eq;

    fn text_row(cells: &[&str]) -> Vec<Value> {
        cells
            .iter()
            .map(|cell| {
                if cell.is_empty() {
                    Value::Empty
                } else {
                    Value::from(*cell)
                }
            })
            .collect()
    }

    #[test]
    fn dedupe_suffixes_repeats() {
        let names = vec![
            "Amount".to_owned(),
            "Fee".to_owned(),
            "Amount".to_owned(),
            "Amount".to_owned(),
        ];

        assert_eq!(
            dedupe_headers(names),
            vec!["Amount", "Fee", "Amount_1", "Amount_2"]
        );
    }

    #[test]
    fn collect_skips_blank_header_cells() {
        let grid = SheetGrid::from_rows(
            "April",
            vec![text_row(&["Date", "", "Biller\u{a0}Name", " Amount "])],
        );

        let headers = collect_headers(&grid, 0);
        assert_eq!(
            headers,
            vec![
                ("Date".to_owned(), 0),
                ("Biller Name".to_owned(), 2),
                ("Amount".to_owned(), 3),
            ]
        );
    }

    #[test]
    fn infer_picks_widest_header() {
        let narrow = SheetGrid::from_rows(
            "March",
            vec![text_row(&["Date", "Biller Name"])],
        );
        let wide = SheetGrid::from_rows(
            "April",
            vec![
                text_row(&["All Billers"]),
                text_row(&["Date", "Biller Name", "Amount", "Status"]),
            ],
        );
        let headerless = SheetGrid::from_rows("Notes", vec![text_row(&["scratch"])]);

        let schema = SchemaSpec::infer(&[narrow, wide, headerless], "Date", 10).unwrap();
        assert_eq!(
            schema.columns(),
            ["Date", "Biller Name", "Amount", "Status"]
        );
    }

    #[test]
    fn infer_without_headers_is_none() {
        let grids = vec![SheetGrid::from_rows("Notes", vec![text_row(&["scratch"])])];

        assert_eq!(SchemaSpec::infer(&grids, "Date", 10), None);
    }

    #[test]
    fn reindex_fills_missing_and_drops_extra() {
        let rows = vec![vec![
            Value::from("d1"),
            Value::from("Acme"),
            Value::from("ignored"),
        ]];
        let headers = vec![
            "Date".to_owned(),
            "Biller Name".to_owned(),
            "Notes".to_owned(),
        ];
        let schema = vec![
            "Date".to_owned(),
            "Amount".to_owned(),
            "Biller Name".to_owned(),
        ];

        let result = reindex(rows, &headers, &schema);
        assert_eq!(
            result,
            vec![vec![
                Value::from("d1"),
                Value::Empty,
                Value::from("Acme"),
            ]]
        );
    }
}
