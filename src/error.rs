use thiserror::Error;

/// Main error type for the crate.
/// Aggregates errors from various sources including standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum SheetMergeError {
    #[error("{0}")]
    WithContextError(String),

    #[error("{0}")]
    AnyhowError(#[from] anyhow::Error),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    #[error("{0}")]
    ParseDateTimeError(#[from] chrono::ParseError),

    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Grid module errors
    #[error("{0}")]
    RangeError(#[from] crate::grid::RangeError),

    // Table module errors
    #[error("{0}")]
    TableError(#[from] crate::table::TableError),

    // Workbook module errors
    #[error("{0}")]
    WorkbookError(#[from] crate::workbook::WorkbookError),

    #[error("{0}")]
    XmlHelperError(#[from] crate::workbook::xml::XmlError),
}

pub trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, SheetMergeError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| SheetMergeError::WithContextError(format!("{}: {}", message, e)))
    }
}
