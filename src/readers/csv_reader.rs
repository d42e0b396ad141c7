use crate::error::Result;
use crate::models::RecordSet;
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, warn};

/// Comma-separated reader with a header row.
pub struct CsvReader;

impl CsvReader {
    pub fn new() -> Self {
        Self
    }

    /// Read a delimited file with a header row into a [`RecordSet`].
    ///
    /// Files that are not valid UTF-8 are decoded as Windows-1252, which covers
    /// the accented place names found in the Berkeley Earth exports.
    pub fn read_path(&self, path: &Path) -> Result<RecordSet> {
        let bytes = std::fs::read(path)?;
        let text = decode(&bytes);
        if matches!(text, Cow::Owned(_)) {
            warn!(
                "{} is not valid UTF-8, decoded as Windows-1252",
                path.display()
            );
        }

        let records = self.read_str(&text)?;
        debug!("Read {} rows from {}", records.len(), path.display());
        Ok(records)
    }

    pub fn read_str(&self, text: &str) -> Result<RecordSet> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::Headers)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut records = RecordSet::new(headers);

        for result in reader.records() {
            let record = result?;
            records.push_row(record.iter().map(str::to_string).collect())?;
        }

        Ok(records)
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            Cow::Owned(text.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_city_file() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "dt,AverageTemperature,City,Country,Latitude,Longitude")?;
        writeln!(temp_file, "1849-01-01,26.704,Abidjan,Côte D'Ivoire,5.63N,3.23W")?;
        writeln!(temp_file, "1849-02-01,,Abidjan,Côte D'Ivoire,5.63N,3.23W")?;

        let records = CsvReader::new().read_path(temp_file.path())?;

        assert_eq!(records.len(), 2);
        assert_eq!(records.headers()[1], "AverageTemperature");
        assert_eq!(records.value(0, "Country"), Some("Côte D'Ivoire"));
        assert_eq!(records.value(1, "AverageTemperature"), Some(""));
        Ok(())
    }

    #[test]
    fn test_windows_1252_fallback() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        // "Curaçao" with ç as the single byte 0xE7
        temp_file.write_all(b"dt,Country\n1900-01-01,Cura\xe7ao\n")?;

        let records = CsvReader::new().read_path(temp_file.path())?;
        assert_eq!(records.value(0, "Country"), Some("Curaçao"));
        Ok(())
    }

    #[test]
    fn test_byte_order_mark_is_dropped() {
        let records = CsvReader::new()
            .read_str("\u{feff}dt,Country\n1900-01-01,Chile\n")
            .unwrap();
        assert_eq!(records.headers()[0], "dt");
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = CsvReader::new()
            .read_str("dt,Country\n1900-01-01,Chile,extra\n")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn test_missing_file() {
        let err = CsvReader::new()
            .read_path(Path::new("no/such/file.csv"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }
}
