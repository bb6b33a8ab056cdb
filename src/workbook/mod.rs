//! # Workbook Reading
//!
//! The bundled spreadsheet adapter: opens `.xlsx`/`.xlsm` files and reads
//! their worksheets into [`SheetGrid`](crate::grid::SheetGrid)s. Other
//! spreadsheet sources can feed the extraction layer by implementing
//! [`Grid`](crate::grid::Grid) themselves.
pub mod filter;
pub(crate) mod xlsx;
pub mod xml;

pub use filter::SheetFilter;

use crate::error::SheetMergeError;
use crate::grid::SheetGrid;
use crate::workbook::xlsx::XlsxWorkbook;
use std::ffi::OsStr;
use std::path::Path;
use thiserror::Error;

/// Errors raised while opening or reading a workbook file.
#[derive(Error, Debug)]
pub enum WorkbookError {
    /// Unsupported or unrecognized file extension
    #[error("Cannot detect file format for '{name}'")]
    InvalidFileFormat { name: String },

    /// A required part of the file is missing from the archive
    #[error("Missing workbook part '{0}'")]
    MissingPart(String),

    /// The workbook contains no sheets
    #[error("Workbook '{0}' has no sheets")]
    EmptyWorkbook(String),
}

/// An open workbook file.
#[derive(Debug)]
pub struct Workbook {
    inner: XlsxWorkbook,
}

impl Workbook {
    /// Opens a workbook, detecting the format from the file extension.
    /// Only `.xlsx` and `.xlsm` are supported.
    pub fn open<P>(path: P) -> Result<Workbook, SheetMergeError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        match path.extension().and_then(OsStr::to_str) {
            Some("xlsx") | Some("xlsm") => Ok(Workbook {
                inner: XlsxWorkbook::open(path)?,
            }),
            _ => Err(WorkbookError::InvalidFileFormat {
                name: path.to_string_lossy().to_string(),
            })?,
        }
    }

    /// Names of all sheets in workbook order, hidden ones included.
    pub fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    /// Reads every sheet accepted by the filter into a grid.
    pub fn read_sheets(&mut self, filter: &SheetFilter) -> Result<Vec<SheetGrid>, SheetMergeError> {
        self.inner.read_sheets(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_extension_is_rejected() {
        let error = Workbook::open("report.csv").unwrap_err();
        assert!(matches!(
            error,
            SheetMergeError::WorkbookError(WorkbookError::InvalidFileFormat { .. })
        ));

        let error = Workbook::open("report").unwrap_err();
        assert!(matches!(
            error,
            SheetMergeError::WorkbookError(WorkbookError::InvalidFileFormat { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let error = Workbook::open("no_such_file.xlsx").unwrap_err();
        assert!(matches!(error, SheetMergeError::IoError(_)));
    }
}
