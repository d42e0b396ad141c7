use crate::database::sql::{column_list, qualified};
use crate::database::TableDescription;
use crate::error::{EtlError, Result};
use crate::models::{ColumnType, RecordSet};
use crate::utils::constants::{DATE_FORMATS, DEFAULT_BATCH_SIZE, MAX_BIND_PARAMETERS};
use crate::utils::ProgressReporter;
use chrono::NaiveDate;
use tokio_postgres::types::ToSql;
use tokio_postgres::Client;
use tracing::debug;

/// A CSV cell converted to the type of its destination column. `None` is NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Float(Option<f64>),
    Date(Option<NaiveDate>),
    Text(Option<String>),
    Boolean(Option<bool>),
}

impl CellValue {
    /// Parse `raw` for a column of type `column_type`. Empty cells become NULL.
    pub fn parse(raw: &str, column_type: ColumnType) -> std::result::Result<Self, &'static str> {
        let trimmed = raw.trim();
        let empty = trimmed.is_empty();

        match column_type {
            ColumnType::Float => {
                if empty {
                    return Ok(CellValue::Float(None));
                }
                trimmed
                    .parse::<f64>()
                    .map(|v| CellValue::Float(Some(v)))
                    .map_err(|_| "float")
            }
            ColumnType::Date => {
                if empty {
                    return Ok(CellValue::Date(None));
                }
                DATE_FORMATS
                    .iter()
                    .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
                    .map(|d| CellValue::Date(Some(d)))
                    .ok_or("date")
            }
            ColumnType::Text => Ok(CellValue::Text(if raw.is_empty() {
                None
            } else {
                Some(raw.to_string())
            })),
            ColumnType::Boolean => {
                if empty {
                    return Ok(CellValue::Boolean(None));
                }
                match trimmed.to_lowercase().as_str() {
                    "true" | "t" | "1" | "yes" | "y" => Ok(CellValue::Boolean(Some(true))),
                    "false" | "f" | "0" | "no" | "n" => Ok(CellValue::Boolean(Some(false))),
                    _ => Err("boolean"),
                }
            }
            ColumnType::Geometry => Err("geometry"),
        }
    }

    fn as_param(&self) -> &(dyn ToSql + Sync) {
        match self {
            CellValue::Float(v) => v,
            CellValue::Date(v) => v,
            CellValue::Text(v) => v,
            CellValue::Boolean(v) => v,
        }
    }
}

/// Placeholder cast so the parameter type is fixed regardless of the column's exact type.
fn placeholder_cast(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Float => "float8",
        ColumnType::Date => "date",
        ColumnType::Text => "text",
        ColumnType::Boolean => "bool",
        ColumnType::Geometry => "geometry",
    }
}

/// Appends a [`RecordSet`] to an existing table with batched multi-row inserts.
pub struct PostgresWriter {
    batch_size: usize,
}

impl PostgresWriter {
    pub fn new() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Match each CSV header to a writable column of the target table.
    pub fn resolve_columns(
        &self,
        records: &RecordSet,
        description: &TableDescription,
    ) -> Result<Vec<ColumnType>> {
        records
            .headers()
            .iter()
            .map(|header| {
                let column = description.column(header).ok_or_else(|| {
                    EtlError::Schema(format!(
                        "Column '{}' does not exist in {}.{}",
                        header, description.schema, description.table
                    ))
                })?;

                match column.column_type {
                    Some(ColumnType::Geometry) => Err(EtlError::InvalidFormat(format!(
                        "Column '{}' is computed by the database and cannot be loaded",
                        header
                    ))),
                    Some(column_type) => Ok(column_type),
                    None => Err(EtlError::Schema(format!(
                        "Column '{}' has unsupported type {}",
                        header, column.pg_type
                    ))),
                }
            })
            .collect()
    }

    /// Convert every cell up front so a bad value fails the load before any insert.
    pub fn convert_rows(
        &self,
        records: &RecordSet,
        column_types: &[ColumnType],
    ) -> Result<Vec<Vec<CellValue>>> {
        records
            .rows()
            .iter()
            .enumerate()
            .map(|(row_index, row)| {
                row.iter()
                    .zip(column_types)
                    .zip(records.headers())
                    .map(|((raw, column_type), header)| {
                        CellValue::parse(raw, *column_type).map_err(|target| EtlError::Coercion {
                            row: row_index + 1,
                            column: header.clone(),
                            value: raw.clone(),
                            target,
                        })
                    })
                    .collect()
            })
            .collect()
    }

    /// Rows per INSERT, bounded by the protocol's bind parameter limit.
    pub fn rows_per_statement(&self, column_count: usize) -> usize {
        if column_count == 0 {
            return self.batch_size;
        }
        self.batch_size.min(MAX_BIND_PARAMETERS / column_count).max(1)
    }

    fn has_full_batch(&self, row_count: usize, rows_per_statement: usize) -> bool {
        row_count >= rows_per_statement
    }

    pub fn insert_sql(
        &self,
        schema: &str,
        table: &str,
        headers: &[String],
        column_types: &[ColumnType],
        row_count: usize,
    ) -> String {
        let width = headers.len();
        let values: Vec<String> = (0..row_count)
            .map(|row| {
                let placeholders: Vec<String> = column_types
                    .iter()
                    .enumerate()
                    .map(|(col, column_type)| {
                        format!("${}::{}", row * width + col + 1, placeholder_cast(*column_type))
                    })
                    .collect();
                format!("({})", placeholders.join(", "))
            })
            .collect();

        format!(
            "INSERT INTO {} ({}) VALUES {}",
            qualified(schema, table),
            column_list(headers.iter().map(String::as_str)),
            values.join(", ")
        )
    }

    /// Append all rows inside one transaction. Returns the number of inserted rows.
    pub async fn append(
        &self,
        client: &mut Client,
        description: &TableDescription,
        records: &RecordSet,
        progress: &ProgressReporter,
    ) -> Result<u64> {
        if records.is_empty() || records.headers().is_empty() {
            return Ok(0);
        }

        let column_types = self.resolve_columns(records, description)?;
        let rows = self.convert_rows(records, &column_types)?;
        let chunk_rows = self.rows_per_statement(column_types.len());

        let transaction = client.transaction().await?;
        // Only files with at least one full batch reuse a prepared statement.
        let full_batch = if self.has_full_batch(rows.len(), chunk_rows) {
            Some(
                transaction
                    .prepare(&self.insert_sql(
                        &description.schema,
                        &description.table,
                        records.headers(),
                        &column_types,
                        chunk_rows,
                    ))
                    .await?,
            )
        } else {
            None
        };

        let mut inserted = 0u64;
        for chunk in rows.chunks(chunk_rows) {
            let params: Vec<&(dyn ToSql + Sync)> = chunk
                .iter()
                .flat_map(|row| row.iter().map(CellValue::as_param))
                .collect();

            let count = match &full_batch {
                Some(statement) if chunk.len() == chunk_rows => {
                    transaction.execute(statement, &params).await?
                }
                _ => {
                    let sql = self.insert_sql(
                        &description.schema,
                        &description.table,
                        records.headers(),
                        &column_types,
                        chunk.len(),
                    );
                    transaction.execute(sql.as_str(), &params).await?
                }
            };

            inserted += count;
            progress.increment(chunk.len() as u64);
            debug!("Inserted {} rows into {}.{}", inserted, description.schema, description.table);
        }

        transaction.commit().await?;
        Ok(inserted)
    }
}

impl Default for PostgresWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DescribedColumn;
    use crate::error::ErrorKind;

    fn described(name: &str, pg_type: &str) -> DescribedColumn {
        DescribedColumn {
            name: name.to_string(),
            pg_type: pg_type.to_string(),
            column_type: ColumnType::from_pg_type_name(pg_type),
        }
    }

    fn city_description() -> TableDescription {
        TableDescription {
            schema: "public".to_string(),
            table: "city".to_string(),
            columns: vec![
                described("dt", "date"),
                described("city_temperature", "float8"),
                described("city", "text"),
                described("latitude", "float8"),
                described("geometry", "geometry"),
            ],
        }
    }

    fn records(headers: &[&str], rows: &[&[&str]]) -> RecordSet {
        let mut set = RecordSet::new(headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            set.push_row(row.iter().map(|v| v.to_string()).collect()).unwrap();
        }
        set
    }

    #[test]
    fn test_cell_parsing() {
        assert_eq!(
            CellValue::parse("3.2", ColumnType::Float),
            Ok(CellValue::Float(Some(3.2)))
        );
        assert_eq!(
            CellValue::parse("-79.4", ColumnType::Float),
            Ok(CellValue::Float(Some(-79.4)))
        );
        assert_eq!(CellValue::parse("", ColumnType::Float), Ok(CellValue::Float(None)));
        assert_eq!(
            CellValue::parse("2020-01-01", ColumnType::Date),
            Ok(CellValue::Date(NaiveDate::from_ymd_opt(2020, 1, 1)))
        );
        assert_eq!(
            CellValue::parse("1743/11/01", ColumnType::Date),
            Ok(CellValue::Date(NaiveDate::from_ymd_opt(1743, 11, 1)))
        );
        assert_eq!(
            CellValue::parse("Toronto", ColumnType::Text),
            Ok(CellValue::Text(Some("Toronto".to_string())))
        );
        assert_eq!(CellValue::parse("", ColumnType::Text), Ok(CellValue::Text(None)));
        assert_eq!(
            CellValue::parse("T", ColumnType::Boolean),
            Ok(CellValue::Boolean(Some(true)))
        );

        assert_eq!(CellValue::parse("warm", ColumnType::Float), Err("float"));
        assert_eq!(CellValue::parse("2020-13-45", ColumnType::Date), Err("date"));
        assert_eq!(CellValue::parse("maybe", ColumnType::Boolean), Err("boolean"));
    }

    #[test]
    fn test_resolve_columns() {
        let writer = PostgresWriter::new();
        let description = city_description();

        let ok = records(&["dt", "city", "city_temperature"], &[]);
        assert_eq!(
            writer.resolve_columns(&ok, &description).unwrap(),
            vec![ColumnType::Date, ColumnType::Text, ColumnType::Float]
        );

        let unknown = records(&["dt", "mystery"], &[]);
        let err = writer.resolve_columns(&unknown, &description).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);

        let geometry = records(&["geometry"], &[]);
        let err = writer.resolve_columns(&geometry, &description).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
    }

    #[test]
    fn test_convert_rows_reports_position() {
        let writer = PostgresWriter::new();
        let set = records(
            &["dt", "city_temperature"],
            &[&["2020-01-01", "3.2"], &["2020-02-01", "n/a"]],
        );

        let err = writer
            .convert_rows(&set, &[ColumnType::Date, ColumnType::Float])
            .unwrap_err();
        match err {
            EtlError::Coercion { row, column, value, target } => {
                assert_eq!(row, 2);
                assert_eq!(column, "city_temperature");
                assert_eq!(value, "n/a");
                assert_eq!(target, "float");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_insert_sql() {
        let writer = PostgresWriter::new();
        let headers = vec!["dt".to_string(), "city".to_string()];
        let sql = writer.insert_sql(
            "public",
            "city",
            &headers,
            &[ColumnType::Date, ColumnType::Text],
            2,
        );

        assert_eq!(
            sql,
            "INSERT INTO \"public\".\"city\" (\"dt\", \"city\") \
             VALUES ($1::date, $2::text), ($3::date, $4::text)"
        );
    }

    #[test]
    fn test_rows_per_statement_respects_parameter_limit() {
        let writer = PostgresWriter::new().with_batch_size(100_000);
        assert_eq!(writer.rows_per_statement(7), 65_535 / 7);

        let writer = PostgresWriter::new().with_batch_size(500);
        assert_eq!(writer.rows_per_statement(7), 500);
    }

    #[test]
    fn test_short_files_skip_the_full_batch_statement() {
        let writer = PostgresWriter::new();
        let per_statement = writer.rows_per_statement(3);
        assert_eq!(per_statement, 1000);
        assert!(!writer.has_full_batch(3, per_statement));
        assert!(writer.has_full_batch(1000, per_statement));
        assert!(writer.has_full_batch(2500, per_statement));
    }
}
