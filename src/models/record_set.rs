use crate::error::{EtlError, Result};

/// In-memory table of string cells, held between extraction and load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RecordSet {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn with_capacity(headers: Vec<String>, capacity: usize) -> Self {
        Self {
            headers,
            rows: Vec::with_capacity(capacity),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.headers.len() {
            return Err(EtlError::InvalidFormat(format!(
                "Row {} has {} fields, expected {}",
                self.rows.len() + 1,
                row.len(),
                self.headers.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn rename_columns<F>(&mut self, mut rename: F)
    where
        F: FnMut(&str) -> String,
    {
        for header in &mut self.headers {
            *header = rename(header);
        }
    }

    /// Rewrite every cell of `column` in place. Fails on the first rejected cell.
    pub fn try_map_column<F>(&mut self, column: &str, mut map: F) -> Result<()>
    where
        F: FnMut(&str) -> Result<String>,
    {
        let index = self
            .column_index(column)
            .ok_or_else(|| EtlError::MissingColumn(column.to_string()))?;

        for row in &mut self.rows {
            row[index] = map(&row[index])?;
        }
        Ok(())
    }

    pub fn retain_rows<F>(&mut self, keep: F)
    where
        F: FnMut(&Vec<String>) -> bool,
    {
        self.rows.retain(keep);
    }

    /// Value of `column` in `row`, for lookups in tests and reports.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }
}
