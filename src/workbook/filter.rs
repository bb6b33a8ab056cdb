use crate::grid::Range;
use glob::Pattern;
use std::collections::HashSet;

/// Criteria for selecting which sheets to read and which cells to keep.
///
/// The default filter takes every visible sheet in full; the reconciliation
/// workbooks exclude their template and summary sheets by name.
#[derive(Clone, Debug, Default)]
pub struct SheetFilter {
    /// Sheet name patterns; `None` accepts every sheet.
    pub name_patterns: Option<Vec<Pattern>>,

    /// Sheet names to skip regardless of patterns.
    pub excluded_names: HashSet<String>,

    /// Whether hidden sheets are read. Off by default.
    pub include_hidden: bool,

    /// Cell window applied while reading each sheet. Cell positions keep
    /// their absolute indexes; cells outside the window are dropped.
    pub region: Option<Range>,

    /// Maximum number of sheets to read.
    pub sheet_limit: Option<usize>,
}

impl SheetFilter {
    /// A filter accepting every visible sheet.
    pub fn new() -> Self {
        SheetFilter::default()
    }

    /// Restricts reading to sheets matching any of the glob patterns.
    pub fn include<I, S>(mut self, patterns: I) -> Result<Self, glob::PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| Pattern::new(pattern.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.name_patterns = Some(patterns);
        Ok(self)
    }

    /// Skips the named sheets entirely.
    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Reads hidden sheets too.
    pub fn include_hidden(mut self) -> Self {
        self.include_hidden = true;
        self
    }

    /// Restricts reading to a cell window.
    pub fn region(mut self, region: Range) -> Self {
        self.region = Some(region);
        self
    }

    /// Caps the number of sheets read.
    pub fn limit(mut self, sheets: usize) -> Self {
        self.sheet_limit = Some(sheets);
        self
    }

    /// Checks whether a sheet passes the filter.
    pub(crate) fn accept(&self, sheet_name: &str, visible: bool) -> bool {
        if !visible && !self.include_hidden {
            return false;
        }
        if self.excluded_names.contains(sheet_name) {
            return false;
        }
        if let Some(patterns) = &self.name_patterns {
            patterns.iter().any(|pattern| pattern.matches(sheet_name))
        } else {
            true
        }
    }
}
