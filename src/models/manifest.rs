use crate::error::{EtlError, Result};
use crate::models::ColumnType;
use crate::utils::constants::{
    CITY_MARKER, COUNTRY_COLUMN, DATE_COLUMN, GEOMETRY_COLUMN, LINK_MARKER,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use validator::Validate;

/// Declarative description of every table the pipeline manages.
///
/// The JSON layout keeps the `database` key of the original manifest files:
///
/// ```json
/// { "database": [ { "name": "...", "columns": [...], "unique": [...] } ] }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Manifest {
    #[serde(rename = "database")]
    #[validate(nested)]
    pub tables: Vec<TableSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TableSpec {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(length(min = 1))]
    #[validate(nested)]
    pub columns: Vec<ColumnSpec>,

    #[serde(default)]
    pub unique: Vec<UniqueColumn>,

    /// Present on link tables only: the two source tables and their projections.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub combination: Vec<CombinationSide>,

    #[serde(default = "default_join_keys")]
    pub join_on: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ColumnSpec {
    #[validate(length(min = 1))]
    pub name: String,
    pub dtype: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueColumn {
    pub name: String,
}

/// One side of a join combination. Accepts both the `table1`/`table1_columns`
/// and `table2`/`table2_columns` spellings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinationSide {
    #[serde(alias = "table1", alias = "table2")]
    pub table: String,

    #[serde(alias = "table1_columns", alias = "table2_columns")]
    pub columns: Vec<String>,
}

/// Resolved join description for a link table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub left: CombinationSide,
    pub right: CombinationSide,
    pub keys: Vec<String>,
}

impl JoinSpec {
    /// Destination columns in insertion order: left projection, then right.
    pub fn target_columns(&self) -> Vec<&str> {
        self.left
            .columns
            .iter()
            .chain(self.right.columns.iter())
            .map(String::as_str)
            .collect()
    }
}

fn default_join_keys() -> Vec<String> {
    vec![DATE_COLUMN.to_string(), COUNTRY_COLUMN.to_string()]
}

impl Manifest {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            EtlError::Config(format!(
                "Cannot open manifest {}: {}",
                path.display(),
                e
            ))
        })?;
        let manifest: Manifest = serde_json::from_reader(BufReader::new(file))?;
        manifest.check()?;
        Ok(manifest)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(json)?;
        manifest.check()?;
        Ok(manifest)
    }

    /// Field validation plus the cross-field rules `validator` cannot express.
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        for table in &self.tables {
            let mut seen = HashSet::new();
            for column in &table.columns {
                if !seen.insert(column.name.as_str()) {
                    return Err(EtlError::Config(format!(
                        "Duplicate column '{}' in manifest table '{}'",
                        column.name, table.name
                    )));
                }
            }

            for unique in &table.unique {
                if !seen.contains(unique.name.as_str()) {
                    return Err(EtlError::Config(format!(
                        "Unique column '{}' is not a column of '{}'",
                        unique.name, table.name
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn require(&self, name: &str) -> Result<&TableSpec> {
        self.find(name).ok_or_else(|| EtlError::TableNotInManifest {
            table: name.to_string(),
        })
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }
}

impl TableSpec {
    pub fn is_link_table(&self) -> bool {
        self.name.to_lowercase().contains(LINK_MARKER)
    }

    pub fn is_city_table(&self) -> bool {
        self.name.to_lowercase().contains(CITY_MARKER)
    }

    pub fn unique_columns(&self) -> Vec<&str> {
        self.unique.iter().map(|u| u.name.as_str()).collect()
    }

    /// First geometry column, falling back to the conventional name.
    pub fn geometry_column(&self) -> &str {
        self.columns
            .iter()
            .find(|c| c.dtype == ColumnType::Geometry)
            .map(|c| c.name.as_str())
            .unwrap_or(GEOMETRY_COLUMN)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.dtype)
    }

    pub fn join_spec(&self) -> Result<JoinSpec> {
        if self.combination.len() < 2 {
            return Err(EtlError::Schema(format!(
                "Table '{}' has no join combination with two source tables",
                self.name
            )));
        }
        if self.join_on.is_empty() {
            return Err(EtlError::Schema(format!(
                "Table '{}' declares an empty join key list",
                self.name
            )));
        }

        let spec = JoinSpec {
            left: self.combination[0].clone(),
            right: self.combination[1].clone(),
            keys: self.join_on.clone(),
        };

        let mut seen = HashSet::new();
        for column in spec.target_columns() {
            if !seen.insert(column) {
                return Err(EtlError::Schema(format!(
                    "Column '{}' is projected from both sides of '{}'",
                    column, self.name
                )));
            }
        }

        Ok(spec)
    }
}
