use serde::Deserialize;
use serde::Serialize;

/// Criteria controlling how a table is located and cleaned within a grid.
///
/// Marker strings, sentinels and scan limits vary per deployment (the
/// reconciliation workbooks mix English and Arabic phrases), so all of them
/// are supplied by the caller; the serde derives let a deployment keep them
/// in a config file next to the workbooks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractCriteria {
    /// Header cell that anchors the header row (e.g. "Date").
    pub marker: String,

    /// How many leading rows to scan for the header row.
    pub max_scan_rows: usize,

    /// How many rows below the header to consider before giving up.
    pub max_data_rows: usize,

    /// Substrings that mark the start of trailing summary content;
    /// matched case-sensitively against the first cells of each row.
    pub stop_markers: Vec<String>,

    /// Columns forward-filled across merged/blank cells; rows where all of
    /// them stay blank are dropped.
    pub key_columns: Vec<String>,

    /// Column checked against `total_sentinels` to drop subtotal rows.
    pub identity_column: Option<String>,

    /// Values (compared case-insensitively after trimming) that mark a
    /// subtotal row in the identity column.
    pub total_sentinels: Vec<String>,

    /// Whether to look for a parallel table to the right of the main one.
    pub detect_parallel: bool,

    /// Minimum empty-column gap between the main and parallel tables.
    pub parallel_min_gap: usize,

    /// How far to the right of the main table to look for a parallel table.
    pub parallel_max_lookahead: usize,
}

impl Default for ExtractCriteria {
    fn default() -> Self {
        ExtractCriteria {
            marker: "Date".to_owned(),
            max_scan_rows: 10,
            max_data_rows: 200,
            stop_markers: Vec::new(),
            key_columns: vec!["Date".to_owned()],
            identity_column: None,
            total_sentinels: vec!["total".to_owned(), String::new()],
            detect_parallel: false,
            parallel_min_gap: 2,
            parallel_max_lookahead: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn criteria_round_trip() {
        let criteria = ExtractCriteria {
            marker: "Date".to_owned(),
            stop_markers: vec!["Company Name".to_owned(), "Sum of".to_owned()],
            key_columns: vec!["Date".to_owned(), "Biller Name".to_owned()],
            identity_column: Some("Biller Name".to_owned()),
            detect_parallel: true,
            ..ExtractCriteria::default()
        };

        let json = serde_json::to_string(&criteria).unwrap();
        let parsed: ExtractCriteria = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, criteria);
    }

    #[test]
    fn criteria_partial_config_uses_defaults() {
        let parsed: ExtractCriteria =
            serde_json::from_str(r#"{"marker": "التاريخ", "stop_markers": ["Sum of"]}"#).unwrap();

        assert_eq!(parsed.marker, "التاريخ");
        assert_eq!(parsed.stop_markers, vec!["Sum of".to_owned()]);
        assert_eq!(parsed.max_scan_rows, 10);
        assert_eq!(parsed.max_data_rows, 200);
    }
}
