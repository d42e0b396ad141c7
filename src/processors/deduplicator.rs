use crate::models::RecordSet;
use std::collections::HashSet;

/// Comparison key for one cell. Numeric columns compare by value so that
/// `3.2` and `3.20` are the same reading.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CellKey {
    Empty,
    Number(u64),
    Text(String),
}

/// Drops duplicate rows, keeping the first occurrence in file order.
#[derive(Debug, Default)]
pub struct Deduplicator;

impl Deduplicator {
    pub fn new() -> Self {
        Self
    }

    /// Returns the number of rows removed.
    pub fn deduplicate(&self, records: &mut RecordSet) -> usize {
        let before = records.len();
        let numeric = numeric_columns(records);

        let mut seen: HashSet<Vec<CellKey>> = HashSet::with_capacity(before);
        records.retain_rows(|row| {
            let key = row
                .iter()
                .zip(&numeric)
                .map(|(cell, &is_numeric)| cell_key(cell, is_numeric))
                .collect();
            seen.insert(key)
        });
        before - records.len()
    }
}

/// A column is numeric when every non-empty cell parses as a finite float.
fn numeric_columns(records: &RecordSet) -> Vec<bool> {
    (0..records.headers().len())
        .map(|col| {
            let mut any_value = false;
            let all_numeric = records.rows().iter().all(|row| {
                let cell = row[col].trim();
                if cell.is_empty() {
                    return true;
                }
                any_value = true;
                parse_number(cell).is_some()
            });
            all_numeric && any_value
        })
        .collect()
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn cell_key(cell: &str, is_numeric: bool) -> CellKey {
    let trimmed = cell.trim();
    if is_numeric {
        if trimmed.is_empty() {
            return CellKey::Empty;
        }
        if let Some(value) = parse_number(trimmed) {
            // -0.0 and 0.0 load as the same value
            let value = if value == 0.0 { 0.0 } else { value };
            return CellKey::Number(value.to_bits());
        }
    }
    CellKey::Text(cell.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_keep_first_occurrence() {
        let mut records = RecordSet::new(row(&["dt", "country", "t"]));
        records.push_row(row(&["2000-01-01", "Chile", "1.0"])).unwrap();
        records.push_row(row(&["2000-02-01", "Chile", "2.0"])).unwrap();
        records.push_row(row(&["2000-01-01", "Chile", "1.0"])).unwrap();
        records.push_row(row(&["2000-01-01", "Chile", "1.5"])).unwrap();
        records.push_row(row(&["2000-02-01", "Chile", "2.0"])).unwrap();

        let dropped = Deduplicator::new().deduplicate(&mut records);

        assert_eq!(dropped, 2);
        assert_eq!(
            records.rows(),
            &[
                row(&["2000-01-01", "Chile", "1.0"]),
                row(&["2000-02-01", "Chile", "2.0"]),
                row(&["2000-01-01", "Chile", "1.5"]),
            ]
        );
    }

    #[test]
    fn test_numeric_cells_compare_by_value() {
        let mut records = RecordSet::new(row(&["dt", "t", "country"]));
        records.push_row(row(&["2020-01-01", "3.2", "Canada"])).unwrap();
        records.push_row(row(&["2020-01-01", "3.20", "Canada"])).unwrap();
        records.push_row(row(&["2020-02-01", "0", "Canada"])).unwrap();
        records.push_row(row(&["2020-02-01", "-0.0", "Canada"])).unwrap();

        assert_eq!(Deduplicator::new().deduplicate(&mut records), 2);
        assert_eq!(
            records.rows(),
            &[
                row(&["2020-01-01", "3.2", "Canada"]),
                row(&["2020-02-01", "0", "Canada"]),
            ]
        );
    }

    #[test]
    fn test_text_columns_keep_exact_comparison() {
        // "Station 7" makes the column textual, so "007" and "7" stay distinct.
        let mut records = RecordSet::new(row(&["code"]));
        records.push_row(row(&["007"])).unwrap();
        records.push_row(row(&["7"])).unwrap();
        records.push_row(row(&["Station 7"])).unwrap();

        assert_eq!(Deduplicator::new().deduplicate(&mut records), 0);
    }

    #[test]
    fn test_empty_cells_compare_equal() {
        let mut records = RecordSet::new(row(&["dt", "t"]));
        records.push_row(row(&["1750-01-01", ""])).unwrap();
        records.push_row(row(&["1750-01-01", ""])).unwrap();

        assert_eq!(Deduplicator::new().deduplicate(&mut records), 1);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_no_duplicates() {
        let mut records = RecordSet::new(row(&["a"]));
        records.push_row(row(&["1"])).unwrap();
        assert_eq!(Deduplicator::new().deduplicate(&mut records), 0);
    }
}
