//! # Header-Driven Table Extraction
//!
//! This module turns one worksheet grid into zero or more normalized tables:
//! locate a header row by a marker column name, determine where the data
//! block beneath it ends, match columns against a schema, optionally fold in
//! a parallel table sharing the same row range, and clean the rows
//! (trimming, merged-cell forward-fill, total-row filtering).
//!
//! Recoverable per-sheet conditions (no header, empty block, no matching
//! columns) are reported as [`SheetOutcome::Skipped`] so a caller can
//! log-and-continue over a multi-sheet batch; only a row misalignment
//! between the main and parallel tables is a hard error.
pub mod block;
pub mod criteria;
pub mod extractor;
pub mod header;
pub mod normalize;
pub mod parallel;
pub mod schema;

use crate::grid::SheetGrid;
use crate::grid::Value;
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

/// Errors raised by table extraction. Everything else in this module is a
/// recoverable skip, not an error.
#[derive(Error, Debug)]
pub enum TableError {
    /// Main and parallel table row counts differ beyond the padding tolerance
    #[error("Sheet '{sheet}': main table has {primary_rows} rows but parallel table has {secondary_rows}")]
    Alignment {
        sheet: String,
        primary_rows: usize,
        secondary_rows: usize,
    },

    /// No sheet in the batch contained a header row to infer a schema from
    #[error("No header row containing '{marker}' found in any sheet")]
    SchemaInference { marker: String },
}

/// Why a sheet produced no table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// No row within the scan window contains the marker column
    HeaderNotFound,
    /// Header found but no data rows before a terminator
    EmptyDataBlock,
    /// The sheet's header matches none of the schema columns
    SchemaMismatch,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            SkipReason::HeaderNotFound => "header row not found",
            SkipReason::EmptyDataBlock => "no data rows below header",
            SkipReason::SchemaMismatch => "no header matches the schema",
        };
        write!(f, "{reason}")
    }
}

/// Result of extracting one sheet.
#[derive(Debug)]
pub enum SheetOutcome {
    /// The sheet produced a table
    Table(Table),
    /// The sheet was skipped for a recoverable reason
    Skipped(SkipReason),
}

/// A normalized table extracted from one sheet (or merged from many).
#[derive(Clone, Debug, Default, Serialize)]
pub struct Table {
    /// Source sheet name (or the combined table's name)
    pub name: String,
    /// Ordered column names; every row has exactly this many values
    pub columns: Vec<String>,
    /// Data rows in source order
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Returns true if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates rows as name-keyed records.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|values| Record {
            columns: &self.columns,
            values,
        })
    }

    /// Renders the table back into a grid: one header row followed by the
    /// data rows, ready to hand to a sheet writer.
    pub fn to_grid(&self) -> SheetGrid {
        let header = self
            .columns
            .iter()
            .map(|name| Value::Text(name.to_owned()))
            .collect();
        let mut rows = Vec::with_capacity(self.rows.len() + 1);
        rows.push(header);
        rows.extend(self.rows.iter().cloned());
        SheetGrid::from_rows(&self.name, rows)
    }
}

/// A borrowed view of one table row keyed by column name.
#[derive(Copy, Clone, Debug)]
pub struct Record<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Record<'a> {
    /// The value under the named column, if the column exists.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|column| column == name)
            .and_then(|index| self.values.get(index))
    }

    /// Iterates (column name, value) pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}
