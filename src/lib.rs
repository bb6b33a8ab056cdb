//! # Sheet Merge
//!
//! A library for turning loosely-structured worksheet grids into clean relational
//! tables and merging them into one combined dataset. Reconciliation workbooks
//! rarely start their tables at cell A1: the table sits below a title block, its
//! header row is found by a known marker column, dates span merged cells, and
//! subtotal rows are sprinkled through the data. This crate locates those tables,
//! cleans them, and stacks them.
//!
//! ## Features
//!
//! - **Header detection**: Locate the header row by a marker column name within a
//!   bounded scan window
//! - **Block boundaries**: Determine where the data ends via stop markers and
//!   blank-row runs, never reading past trailing summary content
//! - **Row normalization**: Trim text, forward-fill merged key columns, and drop
//!   subtotal rows
//! - **Parallel tables**: Detect a second, column-offset table sharing the same
//!   row range and fold it in row-by-row
//! - **Schema alignment**: Normalize heterogeneous sheet headers onto a fixed or
//!   inferred canonical column list
//! - **Batch merging**: Combine per-sheet tables into one, skipping malformed
//!   sheets without aborting the batch
//! - **Workbook reading**: Read `.xlsx`/`.xlsm` files into value grids, with
//!   sheet filtering and typed date/time cells; any other source can plug in
//!   through the [`Grid`] trait
//!
//! ## Example
//!
//! ```no_run
//! use sheet_merge::merge_workbook;
//! use sheet_merge::ExtractCriteria;
//! use sheet_merge::SheetFilter;
//!
//! # fn main() -> Result<(), sheet_merge::SheetMergeError> {
//! let filter = SheetFilter::new().exclude(["Template", "Overall Summary"]);
//! let criteria = ExtractCriteria {
//!     identity_column: Some("Biller Name".to_owned()),
//!     ..ExtractCriteria::default()
//! };
//! let combined = merge_workbook("reconciliation.xlsx", &filter, criteria, None)?;
//! for record in combined.records() {
//!     println!("{:?}", record.get("Biller Name"));
//! }
//! # Ok(())
//! # }
//! ```
pub mod error;
pub mod grid;
pub mod merge;
pub mod table;
pub mod workbook;

pub use crate::error::ResultMessage;
pub use crate::error::SheetMergeError;
pub use crate::grid::Grid;
pub use crate::grid::Range;
pub use crate::grid::SheetGrid;
pub use crate::grid::Value;
pub use crate::merge::merge_grids;
pub use crate::merge::merge_workbook;
pub use crate::merge::Merger;
pub use crate::table::criteria::ExtractCriteria;
pub use crate::table::extractor::RegionExtractor;
pub use crate::table::schema::SchemaSpec;
pub use crate::table::Record;
pub use crate::table::SheetOutcome;
pub use crate::table::SkipReason;
pub use crate::table::Table;
pub use crate::table::TableError;
pub use crate::workbook::SheetFilter;
pub use crate::workbook::Workbook;
pub use crate::workbook::WorkbookError;
