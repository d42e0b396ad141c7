use crate::database::DbSession;
use crate::error::{EtlError, Result};
use crate::models::{ColumnType, TableSpec};
use crate::settings::DatabaseConfig;
use std::collections::HashMap;
use tokio_postgres::Client;

const DESCRIBE_COLUMNS: &str = "\
SELECT a.attname::text, t.typname::text
FROM pg_attribute a
JOIN pg_class c ON c.oid = a.attrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
JOIN pg_type t ON t.oid = a.atttypid
WHERE n.nspname = $1 AND c.relname = $2 AND a.attnum > 0 AND NOT a.attisdropped
ORDER BY a.attnum";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribedColumn {
    pub name: String,
    pub pg_type: String,
    pub column_type: Option<ColumnType>,
}

/// Live column layout of an existing table.
#[derive(Debug, Clone)]
pub struct TableDescription {
    pub schema: String,
    pub table: String,
    pub columns: Vec<DescribedColumn>,
}

impl TableDescription {
    pub fn column(&self, name: &str) -> Option<&DescribedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Differences between this table and its manifest entry, empty when they agree.
    pub fn diff(&self, spec: &TableSpec) -> Vec<String> {
        let mut problems = Vec::new();
        let live: HashMap<&str, &DescribedColumn> =
            self.columns.iter().map(|c| (c.name.as_str(), c)).collect();

        for expected in &spec.columns {
            match live.get(expected.name.as_str()) {
                None => problems.push(format!("missing column '{}'", expected.name)),
                Some(column) if column.column_type != Some(expected.dtype) => {
                    problems.push(format!(
                        "column '{}' is {} in the database but {} in the manifest",
                        expected.name, column.pg_type, expected.dtype
                    ))
                }
                Some(_) => {}
            }
        }

        for column in &self.columns {
            if spec.column_type(&column.name).is_none() {
                problems.push(format!("unexpected column '{}'", column.name));
            }
        }

        problems
    }

    pub fn matches(&self, spec: &TableSpec) -> bool {
        self.diff(spec).is_empty()
    }

    pub fn summary(&self) -> String {
        let mut out = format!("Table {}.{}\n", self.schema, self.table);
        for column in &self.columns {
            out.push_str(&format!("  {:<40} {}\n", column.name, column.pg_type));
        }
        out
    }
}

/// Read a table's layout on an already open session.
pub async fn fetch_description(
    client: &Client,
    schema: &str,
    table: &str,
) -> Result<TableDescription> {
    let rows = client.query(DESCRIBE_COLUMNS, &[&schema, &table]).await?;

    if rows.is_empty() {
        return Err(EtlError::Schema(format!(
            "Table {}.{} does not exist",
            schema, table
        )));
    }

    let columns = rows
        .iter()
        .map(|row| {
            let name: String = row.get(0);
            let pg_type: String = row.get(1);
            DescribedColumn {
                column_type: ColumnType::from_pg_type_name(&pg_type),
                name,
                pg_type,
            }
        })
        .collect();

    Ok(TableDescription {
        schema: schema.to_string(),
        table: table.to_string(),
        columns,
    })
}

/// Introspect `schema.table` in its own session.
pub async fn describe_table(
    config: &DatabaseConfig,
    table: &str,
    schema: &str,
) -> Result<TableDescription> {
    let session = DbSession::acquire(config).await?;
    let result = fetch_description(session.client(), schema, table).await;
    session.release().await;
    result
}
