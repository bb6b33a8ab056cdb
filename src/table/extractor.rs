//! Per-sheet extraction pipeline.

use crate::grid::Grid;
use crate::grid::Value;
use crate::table::block::extract_block;
use crate::table::block::find_data_end_row;
use crate::table::criteria::ExtractCriteria;
use crate::table::header::find_header_row;
use crate::table::header::match_columns;
use crate::table::header::normalize_header;
use crate::table::normalize::normalize_rows;
use crate::table::parallel::concat_aligned;
use crate::table::parallel::find_secondary_table_start;
use crate::table::parallel::secondary_column_span;
use crate::table::parallel::trim_trailing_blank_rows;
use crate::table::schema::collect_headers;
use crate::table::schema::dedupe_headers;
use crate::table::schema::reindex;
use crate::table::schema::SchemaSpec;
use crate::table::SheetOutcome;
use crate::table::SkipReason;
use crate::table::Table;
use crate::table::TableError;

/// Extracts normalized tables from worksheet grids.
///
/// The extractor is a pure function set over its criteria and schema: it
/// holds no mutable state, so one instance can serve any number of grids,
/// concurrently if desired.
#[derive(Clone, Debug)]
pub struct RegionExtractor {
    criteria: ExtractCriteria,
    schema: SchemaSpec,
}

impl RegionExtractor {
    /// Creates an extractor for the given criteria and schema.
    pub fn new(criteria: ExtractCriteria, schema: SchemaSpec) -> Self {
        RegionExtractor { criteria, schema }
    }

    /// The schema every extracted table is aligned to.
    pub fn schema(&self) -> &SchemaSpec {
        &self.schema
    }

    /// Extracts the named grid's table.
    ///
    /// Returns [`SheetOutcome::Skipped`] when the sheet has no header row
    /// within the scan window, no data rows before a terminator, or no
    /// header matching the schema. The only hard error is a main/parallel
    /// row misalignment beyond the padding tolerance.
    pub fn extract<G>(&self, name: &str, grid: &G) -> Result<SheetOutcome, TableError>
    where
        G: Grid + ?Sized,
    {
        let criteria = &self.criteria;
        let Some(header_row) = find_header_row(grid, &criteria.marker, criteria.max_scan_rows)
        else {
            return Ok(SheetOutcome::Skipped(SkipReason::HeaderNotFound));
        };
        let data_end_row =
            find_data_end_row(grid, header_row, &criteria.stop_markers, criteria.max_data_rows);
        if data_end_row == header_row + 1 {
            return Ok(SheetOutcome::Skipped(SkipReason::EmptyDataBlock));
        }

        let (headers, rows) = match &self.schema {
            SchemaSpec::Fixed(spec) => {
                let (mut headers, column_indices) = match_columns(grid, header_row, spec);
                if headers.is_empty() {
                    return Ok(SheetOutcome::Skipped(SkipReason::SchemaMismatch));
                }
                let mut rows = extract_block(grid, header_row, data_end_row, &column_indices);
                if criteria.detect_parallel {
                    let primary_end_column = column_indices.iter().copied().max().unwrap_or(0);
                    if let Some((secondary_headers, mut secondary_rows)) =
                        self.read_secondary(grid, header_row, data_end_row, primary_end_column)
                    {
                        let secondary_width = secondary_headers.len();
                        trim_trailing_blank_rows(&mut rows);
                        trim_trailing_blank_rows(&mut secondary_rows);
                        rows = concat_aligned(
                            name,
                            rows,
                            secondary_rows,
                            headers.len(),
                            secondary_width,
                        )?;
                        headers = dedupe_headers(
                            headers.into_iter().chain(secondary_headers).collect(),
                        );
                    }
                }
                (headers, rows)
            }
            SchemaSpec::Inferred(canonical) => {
                let (sheet_headers, column_indices): (Vec<String>, Vec<usize>) =
                    collect_headers(grid, header_row).into_iter().unzip();
                if !sheet_headers.iter().any(|header| canonical.contains(header)) {
                    return Ok(SheetOutcome::Skipped(SkipReason::SchemaMismatch));
                }
                let rows = extract_block(grid, header_row, data_end_row, &column_indices);
                let rows = reindex(rows, &sheet_headers, canonical);
                (canonical.to_owned(), rows)
            }
        };

        let rows = normalize_rows(
            rows,
            &headers,
            &criteria.key_columns,
            criteria.identity_column.as_deref(),
            &criteria.total_sentinels,
        );
        if rows.is_empty() {
            return Ok(SheetOutcome::Skipped(SkipReason::EmptyDataBlock));
        }

        Ok(SheetOutcome::Table(Table {
            name: name.to_owned(),
            columns: headers,
            rows,
        }))
    }

    /// Locates and reads the parallel table's headers and block, if any.
    /// Blank header cells within the span get positional names.
    fn read_secondary<G>(
        &self,
        grid: &G,
        header_row: usize,
        data_end_row: usize,
        primary_end_column: usize,
    ) -> Option<(Vec<String>, Vec<Vec<Value>>)>
    where
        G: Grid + ?Sized,
    {
        let start = find_secondary_table_start(
            grid,
            header_row,
            primary_end_column,
            self.criteria.parallel_min_gap,
            self.criteria.parallel_max_lookahead,
        )?;
        let span = secondary_column_span(grid, header_row, start);
        if span == 0 {
            return None;
        }
        let column_indices: Vec<usize> = (start..start + span).collect();
        let headers = column_indices
            .iter()
            .enumerate()
            .map(|(index, &col)| {
                let cell = grid.get(header_row, col);
                if cell.is_blank() {
                    format!("column{}", index + 1)
                } else {
                    normalize_header(&cell.to_string())
                }
            })
            .collect();
        let rows = extract_block(grid, header_row, data_end_row, &column_indices);
        Some((headers, rows))
    }
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

    fn billing_criteria() -> ExtractCriteria {
        ExtractCriteria {
            stop_markers: vec!["Company Name".to_owned(), "Sum of".to_owned()],
            key_columns: vec!["Date".to_owned()],
            identity_column: Some("Biller Name".to_owned()),
            ..ExtractCriteria::default()
        }
    }

    fn billing_schema() -> SchemaSpec {
        SchemaSpec::fixed(["Date", "Biller Name", "Amount"])
    }

    fn sheet() -> SheetGrid {
        SheetGrid::from_rows(
            "April",
            vec![
                text_row(&["All Billers Reconciliation"]),
                text_row(&[]),
                text_row(&["Date", "Biller Name", "Amount", "Notes"]),
                text_row(&["2024-04-01", "Acme", "10", "x"]),
                text_row(&["", "Beta", "20", ""]),
                text_row(&["", "Total", "30", ""]),
                text_row(&["2024-04-02", "Gamma", "5", ""]),
                text_row(&[]),
                text_row(&["Company Name", "Share"]),
            ],
        )
    }

    #[test]
    fn extracts_and_normalizes_fixed_schema() {
        let extractor = RegionExtractor::new(billing_criteria(), billing_schema());

        let outcome = extractor.extract("April", &sheet()).unwrap();
        let SheetOutcome::Table(table) = outcome else {
            panic!("expected a table");
        };
        assert_eq!(table.columns, vec!["Date", "Biller Name", "Amount"]);
        // Total row dropped, merged dates filled, Notes column dropped.
        assert_eq!(
            table.rows,
            vec![
                text_row(&["2024-04-01", "Acme", "10"]),
                text_row(&["2024-04-01", "Beta", "20"]),
                text_row(&["2024-04-02", "Gamma", "5"]),
            ]
        );
    }

    #[test]
    fn missing_header_is_skipped() {
        let extractor = RegionExtractor::new(billing_criteria(), billing_schema());
        let grid = SheetGrid::from_rows("Notes", vec![text_row(&["scratch", "pad"])]);

        let outcome = extractor.extract("Notes", &grid).unwrap();
        assert!(matches!(
            outcome,
            SheetOutcome::Skipped(SkipReason::HeaderNotFound)
        ));
    }

    #[test]
    fn header_without_data_is_skipped() {
        let extractor = RegionExtractor::new(billing_criteria(), billing_schema());
        let grid = SheetGrid::from_rows(
            "April",
            vec![text_row(&["Date", "Biller Name", "Amount"])],
        );

        let outcome = extractor.extract("April", &grid).unwrap();
        assert!(matches!(
            outcome,
            SheetOutcome::Skipped(SkipReason::EmptyDataBlock)
        ));
    }

    #[test]
    fn unmatched_schema_is_skipped() {
        let criteria = ExtractCriteria {
            marker: "Date".to_owned(),
            ..billing_criteria()
        };
        let extractor =
            RegionExtractor::new(criteria, SchemaSpec::fixed(["Invoice", "Vendor"]));
        let grid = SheetGrid::from_rows(
            "April",
            vec![
                text_row(&["Date", "Biller Name"]),
                text_row(&["2024-04-01", "Acme"]),
            ],
        );

        let outcome = extractor.extract("April", &grid).unwrap();
        assert!(matches!(
            outcome,
            SheetOutcome::Skipped(SkipReason::SchemaMismatch)
        ));
    }

    #[test]
    fn parallel_table_concatenated_by_row() {
        let criteria = ExtractCriteria {
            detect_parallel: true,
            ..billing_criteria()
        };
        let extractor = RegionExtractor::new(criteria, billing_schema());
        let grid = SheetGrid::from_rows(
            "April",
            vec![
                text_row(&["Date", "Biller Name", "Amount", "", "", "Share", "Fee"]),
                text_row(&["2024-04-01", "Acme", "10", "", "", "0.6", "1"]),
                text_row(&["2024-04-02", "Beta", "20", "", "", "0.4", "2"]),
            ],
        );

        let outcome = extractor.extract("April", &grid).unwrap();
        let SheetOutcome::Table(table) = outcome else {
            panic!("expected a table");
        };
        assert_eq!(
            table.columns,
            vec!["Date", "Biller Name", "Amount", "Share", "Fee"]
        );
        assert_eq!(
            table.rows,
            vec![
                text_row(&["2024-04-01", "Acme", "10", "0.6", "1"]),
                text_row(&["2024-04-02", "Beta", "20", "0.4", "2"]),
            ]
        );
    }

    #[test]
    fn parallel_mismatch_is_an_error() {
        let criteria = ExtractCriteria {
            detect_parallel: true,
            ..billing_criteria()
        };
        let extractor = RegionExtractor::new(criteria, billing_schema());
        // Secondary block keeps two extra trailing rows beyond the main one.
        let grid = SheetGrid::from_rows(
            "April",
            vec![
                text_row(&["Date", "Biller Name", "Amount", "", "", "Share"]),
                text_row(&["2024-04-01", "Acme", "10", "", "", "0.6"]),
                text_row(&["", "", "", "", "", "0.3"]),
                text_row(&["", "", "", "", "", "0.1"]),
            ],
        );

        let error = extractor.extract("April", &grid).unwrap_err();
        assert!(matches!(error, TableError::Alignment { .. }));
    }

    #[test]
    fn inferred_schema_reindexes_each_sheet() {
        let criteria = ExtractCriteria {
            identity_column: None,
            ..billing_criteria()
        };
        let schema = SchemaSpec::Inferred(vec![
            "Date".to_owned(),
            "Biller Name".to_owned(),
            "Amount".to_owned(),
        ]);
        let extractor = RegionExtractor::new(criteria, schema);
        // This sheet misses Amount and carries an extra Status column.
        let grid = SheetGrid::from_rows(
            "March",
            vec![
                text_row(&["Date", "Status", "Biller Name"]),
                text_row(&["2024-03-01", "ok", "Acme"]),
            ],
        );

        let outcome = extractor.extract("March", &grid).unwrap();
        let SheetOutcome::Table(table) = outcome else {
            panic!("expected a table");
        };
        assert_eq!(table.columns, vec!["Date", "Biller Name", "Amount"]);
        assert_eq!(
            table.rows,
            vec![vec![
                Value::from("2024-03-01"),
                Value::from("Acme"),
                Value::Empty,
            ]]
        );
    }
}
