//! Row cleaning: trimming, merged-cell forward-fill, subtotal filtering.

use crate::grid::Value;

/// Cleans extracted rows into their final shape.
///
/// In order: trims every text cell; forward-fills each key column
/// independently, top to bottom (merged date cells leave blanks below the
/// first row of the merge); drops rows whose identity column equals a total
/// sentinel case-insensitively after trimming; drops rows where all key
/// columns are still blank after the fill. Running the result through again
/// changes nothing.
pub fn normalize_rows(
    mut rows: Vec<Vec<Value>>,
    headers: &[String],
    key_columns: &[String],
    identity_column: Option<&str>,
    total_sentinels: &[String],
) -> Vec<Vec<Value>> {
    for row in &mut rows {
        for cell in row.iter_mut() {
            cell.trim_text();
        }
    }

    let key_indices: Vec<usize> = key_columns
        .iter()
        .filter_map(|name| headers.iter().position(|header| header == name))
        .collect();
    for &col in &key_indices {
        forward_fill_column(&mut rows, col);
    }

    if let Some(identity) = identity_column {
        if let Some(col) = headers.iter().position(|header| header == identity) {
            let sentinels: Vec<String> = total_sentinels
                .iter()
                .map(|sentinel| sentinel.trim().to_lowercase())
                .collect();
            rows.retain(|row| {
                let cell = row.get(col).cloned().unwrap_or_default();
                let text = cell.to_string().trim().to_lowercase();
                !sentinels.contains(&text)
            });
        }
    }

    if !key_indices.is_empty() {
        rows.retain(|row| {
            key_indices
                .iter()
                .any(|&col| !row.get(col).map(Value::is_blank).unwrap_or(true))
        });
    }

    rows
}

/// Propagates the last non-blank value of one column into the blank cells
/// below it. Columns are filled independently of each other.
fn forward_fill_column(rows: &mut [Vec<Value>], col: usize) {
    let mut last: Option<Value> = None;
    for row in rows.iter_mut() {
        let Some(cell) = row.get_mut(col) else {
            continue;
        };
        if cell.is_blank() {
            if let Some(value) = &last {
                *cell = value.clone();
            }
        } else {
            last = Some(cell.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    fn sentinels() -> Vec<String> {
        vec!["total".to_owned(), String::new()]
    }

    #[test]
    fn forward_fill_models_merged_cells() {
        let rows = vec![
            vec![Value::from("A"), Value::from("x")],
            vec![Value::Empty, Value::from("x")],
            vec![Value::Empty, Value::from("x")],
            vec![Value::from("B"), Value::from("x")],
            vec![Value::Empty, Value::from("x")],
        ];

        let result = normalize_rows(
            rows,
            &headers(&["Date", "Biller Name"]),
            &headers(&["Date"]),
            None,
            &[],
        );
        let dates: Vec<_> = result.iter().map(|row| row[0].clone()).collect();
        assert_eq!(
            dates,
            vec![
                Value::from("A"),
                Value::from("A"),
                Value::from("A"),
                Value::from("B"),
                Value::from("B"),
            ]
        );
    }

    #[test]
    fn total_rows_dropped_case_insensitively() {
        let rows = vec![
            vec![Value::from("d1"), Value::from("Acme")],
            vec![Value::from("d1"), Value::from("TOTAL")],
            vec![Value::from("d2"), Value::from("  total  ")],
            vec![Value::from("d2"), Value::from("Beta")],
        ];

        let result = normalize_rows(
            rows,
            &headers(&["Date", "Biller Name"]),
            &headers(&["Date"]),
            Some("Biller Name"),
            &sentinels(),
        );
        let names: Vec<_> = result.iter().map(|row| row[1].clone()).collect();
        assert_eq!(names, vec![Value::from("Acme"), Value::from("Beta")]);
    }

    #[test]
    fn blank_identity_dropped_when_sentinel_is_empty() {
        let rows = vec![
            vec![Value::from("d1"), Value::from("Acme")],
            vec![Value::from("d1"), Value::Empty],
        ];

        let result = normalize_rows(
            rows,
            &headers(&["Date", "Biller Name"]),
            &headers(&["Date"]),
            Some("Biller Name"),
            &sentinels(),
        );
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn rows_with_all_key_columns_blank_dropped() {
        let rows = vec![
            vec![Value::Empty, Value::Empty, Value::from("stray")],
            vec![Value::from("d1"), Value::from("Acme"), Value::from("10")],
            vec![Value::Empty, Value::from("Beta"), Value::from("20")],
        ];

        // No preceding value, so the leading blank date stays blank.
        let result = normalize_rows(
            rows,
            &headers(&["Date", "Biller Name", "Amount"]),
            &headers(&["Date", "Biller Name"]),
            None,
            &[],
        );
        assert_eq!(result.len(), 3 - 1);
        assert_eq!(result[0][1], Value::from("Acme"));
    }

    #[test]
    fn trims_text_cells_only() {
        let rows = vec![vec![Value::from("d1"), Value::from("  Acme  "), Value::Number(5.0)]];

        let result = normalize_rows(
            rows,
            &headers(&["Date", "Biller Name", "Amount"]),
            &[],
            None,
            &[],
        );
        assert_eq!(result[0][1], Value::from("Acme"));
        assert_eq!(result[0][2], Value::Number(5.0));
    }

    #[test]
    fn normalize_is_idempotent() {
        let rows = vec![
            vec![Value::from("A"), Value::from(" Acme ")],
            vec![Value::Empty, Value::from("Total")],
            vec![Value::Empty, Value::from("Beta")],
            vec![Value::Empty, Value::Empty],
        ];
        let header_names = headers(&["Date", "Biller Name"]);
        let keys = headers(&["Date"]);

        let once = normalize_rows(
            rows,
            &header_names,
            &keys,
            Some("Biller Name"),
            &sentinels(),
        );
        let twice = normalize_rows(
            once.clone(),
            &header_names,
            &keys,
            Some("Biller Name"),
            &sentinels(),
        );
        assert_eq!(once, twice);
    }
}
