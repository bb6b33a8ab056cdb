//! # Combined Summary Building
//!
//! Feeds a batch of sheet grids through a [`RegionExtractor`], skipping and
//! logging sheets that yield nothing, and merges the surviving tables into
//! one combined table. One malformed worksheet never aborts the batch.

use crate::error::ResultMessage;
use crate::error::SheetMergeError;
use crate::grid::Grid;
use crate::grid::SheetGrid;
use crate::grid::Value;
use crate::table::criteria::ExtractCriteria;
use crate::table::extractor::RegionExtractor;
use crate::table::schema::reindex;
use crate::table::schema::SchemaSpec;
use crate::table::SheetOutcome;
use crate::table::Table;
use crate::table::TableError;
use crate::workbook::SheetFilter;
use crate::workbook::Workbook;
use std::path::Path;

/// Default name of the combined output table.
const COMBINED_TABLE_NAME: &str = "Overall Summary";

/// Accumulates per-sheet tables and merges them into one.
pub struct Merger {
    extractor: RegionExtractor,
    name: String,
    source_column: Option<String>,
    tables: Vec<Table>,
}

impl Merger {
    /// Creates a merger around an extractor. The combined table is named
    /// "Overall Summary" unless overridden with [`Merger::named`].
    pub fn new(extractor: RegionExtractor) -> Self {
        Merger {
            extractor,
            name: COMBINED_TABLE_NAME.to_owned(),
            source_column: None,
            tables: Vec::new(),
        }
    }

    /// Overrides the combined table's name.
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self
    }

    /// Appends a column holding each row's source sheet name, placed last.
    pub fn with_source_column(mut self, name: &str) -> Self {
        self.source_column = Some(name.to_owned());
        self
    }

    /// Extracts one sheet and keeps its table. Recoverable conditions are
    /// logged and skipped; only an alignment violation propagates.
    pub fn add_sheet<G>(&mut self, name: &str, grid: &G) -> Result<(), TableError>
    where
        G: Grid + ?Sized,
    {
        match self.extractor.extract(name, grid)? {
            SheetOutcome::Table(table) => {
                tracing::debug!(sheet = name, rows = table.rows.len(), "sheet extracted");
                self.tables.push(table);
            }
            SheetOutcome::Skipped(reason) => {
                tracing::warn!(sheet = name, %reason, "skipping sheet");
            }
        }
        Ok(())
    }

    /// Tables collected so far, in arrival order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Merges the collected tables into one.
    ///
    /// Columns are unioned in first-seen order; rows from tables missing a
    /// column get empty values there. The source column, if requested, goes
    /// last. An empty result simply has no rows.
    pub fn finish(self) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in &self.tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.to_owned());
                }
            }
        }

        let mut rows = Vec::new();
        for table in &self.tables {
            let mut aligned = reindex(table.rows.to_owned(), &table.columns, &columns);
            if self.source_column.is_some() {
                for row in &mut aligned {
                    row.push(Value::Text(table.name.to_owned()));
                }
            }
            rows.extend(aligned);
        }
        if let Some(source) = self.source_column {
            columns.push(source);
        }

        tracing::debug!(
            tables = self.tables.len(),
            rows = rows.len(),
            columns = columns.len(),
            "merge finished"
        );
        Table {
            name: self.name,
            columns,
            rows,
        }
    }
}

/// Reads a workbook and merges every accepted sheet into one combined
/// table, the way the reconciliation summaries are built.
///
/// With `schema` unset, a canonical schema is first inferred from the
/// widest header row across the accepted sheets; supplying
/// [`SchemaSpec::Fixed`] columns restricts the output to those instead.
/// Each merged row carries its source sheet in a trailing "Sheet_Name"
/// column.
pub fn merge_workbook<P>(
    path: P,
    filter: &SheetFilter,
    criteria: ExtractCriteria,
    schema: Option<SchemaSpec>,
) -> Result<Table, SheetMergeError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut workbook = Workbook::open(path).with_prefix(&path.to_string_lossy())?;
    let grids = workbook.read_sheets(filter)?;

    let schema = match schema {
        Some(schema) => schema,
        None => SchemaSpec::infer(&grids, &criteria.marker, criteria.max_scan_rows).ok_or(
            TableError::SchemaInference {
                marker: criteria.marker.to_owned(),
            },
        )?,
    };

    let mut merger =
        Merger::new(RegionExtractor::new(criteria, schema)).with_source_column("Sheet_Name");
    for grid in &grids {
        merger.add_sheet(&grid.name, grid)?;
    }
    Ok(merger.finish())
}

/// Convenience: merges already-loaded grids with an extractor, without a
/// source column. Useful when grids come from an adapter other than the
/// bundled workbook reader.
pub fn merge_grids(
    extractor: RegionExtractor,
    grids: &[SheetGrid],
) -> Result<Table, TableError> {
    let mut merger = Merger::new(extractor);
    for grid in grids {
        merger.add_sheet(&grid.name, grid)?;
    }
    Ok(merger.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn extractor() -> RegionExtractor {
        let criteria = ExtractCriteria {
            identity_column: Some("Biller Name".to_owned()),
            ..ExtractCriteria::default()
        };
        RegionExtractor::new(criteria, SchemaSpec::fixed(["Date", "Biller Name", "Amount"]))
    }

    fn april() -> SheetGrid {
        SheetGrid::from_rows(
            "April",
            vec![
                text_row(&["Date", "Biller Name", "Amount"]),
                text_row(&["2024-04-01", "Acme", "10"]),
            ],
        )
    }

    fn may() -> SheetGrid {
        // May lacks the Amount column entirely.
        SheetGrid::from_rows(
            "May",
            vec![
                text_row(&["Date", "Biller Name"]),
                text_row(&["2024-05-01", "Beta"]),
            ],
        )
    }

    #[test]
    fn merges_sheets_with_column_union() {
        let mut merger = Merger::new(extractor());
        merger.add_sheet("April", &april()).unwrap();
        merger.add_sheet("May", &may()).unwrap();

        let combined = merger.finish();
        assert_eq!(combined.name, "Overall Summary");
        assert_eq!(combined.columns, vec!["Date", "Biller Name", "Amount"]);
        assert_eq!(
            combined.rows,
            vec![
                text_row(&["2024-04-01", "Acme", "10"]),
                vec![
                    Value::from("2024-05-01"),
                    Value::from("Beta"),
                    Value::Empty,
                ],
            ]
        );
    }

    #[test]
    fn source_column_goes_last() {
        let mut merger = Merger::new(extractor()).with_source_column("Sheet_Name");
        merger.add_sheet("April", &april()).unwrap();
        merger.add_sheet("May", &may()).unwrap();

        let combined = merger.finish();
        assert_eq!(
            combined.columns,
            vec!["Date", "Biller Name", "Amount", "Sheet_Name"]
        );
        assert_eq!(combined.rows[0].last(), Some(&Value::from("April")));
        assert_eq!(combined.rows[1].last(), Some(&Value::from("May")));
    }

    #[test]
    fn skipped_sheets_do_not_abort_the_batch() {
        let mut merger = Merger::new(extractor());
        let scratch = SheetGrid::from_rows("Notes", vec![text_row(&["scratch"])]);
        merger.add_sheet("Notes", &scratch).unwrap();
        merger.add_sheet("April", &april()).unwrap();

        let combined = merger.finish();
        assert_eq!(combined.rows.len(), 1);
    }

    #[test]
    fn empty_batch_finishes_empty() {
        let combined = Merger::new(extractor()).finish();

        assert!(combined.is_empty());
        assert!(combined.columns.is_empty());
    }

    #[test]
    fn merge_grids_runs_the_batch() {
        let combined = merge_grids(extractor(), &[april(), may()]).unwrap();

        assert_eq!(combined.rows.len(), 2);
        assert_eq!(combined.columns.len(), 3);
    }
}
