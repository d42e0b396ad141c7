use crate::error::{EtlError, Result};
use crate::models::RecordSet;
use crate::utils::constants::{LATITUDE_COLUMN, LONGITUDE_COLUMN, TEMPERATURE_MARKER};
use crate::utils::{clean_coordinate, SourceKind};
use tracing::debug;

/// Normalizes headers and coordinate cells so city and country sources line up
/// with the manifest's column names.
pub struct ColumnCleaner {
    source: SourceKind,
}

impl ColumnCleaner {
    pub fn new(source: SourceKind) -> Self {
        Self { source }
    }

    pub fn clean(&self, records: &mut RecordSet) -> Result<()> {
        records.rename_columns(|header| self.normalize_header(header));
        debug!("Normalized headers for {} source: {:?}", self.source, records.headers());

        if self.source.has_coordinates() {
            for column in [LATITUDE_COLUMN, LONGITUDE_COLUMN] {
                records
                    .try_map_column(column, clean_coordinate)
                    .map_err(|e| match e {
                        EtlError::MissingColumn(name) => EtlError::MissingColumn(format!(
                            "{} (required for city sources)",
                            name
                        )),
                        other => other,
                    })?;
            }
        }

        Ok(())
    }

    /// Lower-case a header and qualify ambiguous temperature columns with the source.
    pub fn normalize_header(&self, header: &str) -> String {
        let lowered = header.trim().to_lowercase();

        match self.source.column_prefix() {
            Some(prefix) if lowered.contains(TEMPERATURE_MARKER) && !lowered.starts_with(prefix) => {
                format!("{}{}", prefix, lowered)
            }
            _ => lowered,
        }
    }
}
