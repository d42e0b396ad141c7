use crate::utils::constants::TARGET_SRID;
use serde::{Deserialize, Serialize};

/// Semantic column types a manifest may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[serde(alias = "numeric")]
    Float,
    Date,
    Text,
    Boolean,
    Geometry,
}

impl ColumnType {
    /// PostgreSQL DDL for this type.
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::Float => "DOUBLE PRECISION".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Geometry => format!("geometry(POINTZ, {})", TARGET_SRID),
        }
    }

    /// Reverse mapping from `pg_type.typname`, used when introspecting tables.
    pub fn from_pg_type_name(type_name: &str) -> Option<Self> {
        match type_name {
            "float8" | "float4" | "numeric" => Some(ColumnType::Float),
            "date" => Some(ColumnType::Date),
            "text" | "varchar" | "bpchar" => Some(ColumnType::Text),
            "bool" => Some(ColumnType::Boolean),
            "geometry" => Some(ColumnType::Geometry),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Float => "float",
            ColumnType::Date => "date",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Geometry => "geometry",
        }
    }

    pub fn needs_spatial_index(&self) -> bool {
        matches!(self, ColumnType::Geometry)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_type_mapping() {
        assert_eq!(ColumnType::Float.sql_type(), "DOUBLE PRECISION");
        assert_eq!(ColumnType::Date.sql_type(), "DATE");
        assert_eq!(ColumnType::Text.sql_type(), "TEXT");
        assert_eq!(ColumnType::Boolean.sql_type(), "BOOLEAN");
        assert_eq!(ColumnType::Geometry.sql_type(), "geometry(POINTZ, 3347)");
    }

    #[test]
    fn test_deserialize_dtype_names() {
        let parsed: Vec<ColumnType> =
            serde_json::from_str(r#"["float", "numeric", "date", "text", "boolean", "geometry"]"#)
                .unwrap();
        assert_eq!(
            parsed,
            vec![
                ColumnType::Float,
                ColumnType::Float,
                ColumnType::Date,
                ColumnType::Text,
                ColumnType::Boolean,
                ColumnType::Geometry,
            ]
        );
        assert!(serde_json::from_str::<ColumnType>(r#""integer""#).is_err());
    }

    #[test]
    fn test_pg_type_names() {
        assert_eq!(ColumnType::from_pg_type_name("float8"), Some(ColumnType::Float));
        assert_eq!(ColumnType::from_pg_type_name("geometry"), Some(ColumnType::Geometry));
        assert_eq!(ColumnType::from_pg_type_name("int4"), None);
    }
}
