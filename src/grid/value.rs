use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;

/// A single cell value as produced by a worksheet reader or test fixture.
///
/// Grids are values-only: formatting, formulas and COM objects never reach
/// the extraction layer. Date-like cells arrive already converted to chrono
/// naive types.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Empty,
    /// Boolean values (true/false)
    Bool(bool),
    /// Numeric values, including integers (Excel stores both as doubles)
    Number(f64),
    /// Text values
    Text(String),
    /// Date without time component
    Date(NaiveDate),
    /// Time without date component
    Time(NaiveTime),
    /// Date and time
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns true if the cell holds no value at all.
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Returns true if the cell is empty or holds only whitespace text.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Strips leading/trailing whitespace from text cells in place.
    /// Non-text values pass through unchanged.
    pub(crate) fn trim_text(&mut self) {
        if let Value::Text(text) = self {
            let trimmed = text.trim();
            if trimmed.len() != text.len() {
                *text = trimmed.to_owned();
            }
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Number(value) => write!(f, "{value}"),
            Value::Text(value) => write!(f, "{value}"),
            Value::Date(value) => write!(f, "{value}"),
            Value::Time(value) => write!(f, "{value}"),
            Value::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}
