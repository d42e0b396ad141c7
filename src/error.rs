use thiserror::Error;
use tokio_postgres::error::SqlState;

pub type Result<T> = std::result::Result<T, EtlError>;

/// Coarse failure category, used by callers to decide whether to log, retry or abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Connection,
    Schema,
    Data,
    ConstraintViolation,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Connection => "ConnectionError",
            ErrorKind::Schema => "SchemaError",
            ErrorKind::Data => "DataError",
            ErrorKind::ConstraintViolation => "ConstraintViolation",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] ::config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Connection to database failed: {0}")]
    Connection(#[source] tokio_postgres::Error),

    #[error("The table {table} does not exist in the manifest")]
    TableNotInManifest { table: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid coordinate format: {0}")]
    InvalidCoordinate(String),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),

    #[error("Cannot convert '{value}' in column '{column}' (row {row}) to {target}")]
    Coercion {
        row: usize,
        column: String,
        value: String,
        target: &'static str,
    },

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),
}

impl EtlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EtlError::Json(_)
            | EtlError::Config(_)
            | EtlError::ConfigSource(_)
            | EtlError::Validation(_) => ErrorKind::Configuration,

            EtlError::Connection(_) => ErrorKind::Connection,

            EtlError::TableNotInManifest { .. } | EtlError::Schema(_) => ErrorKind::Schema,

            EtlError::Io(_)
            | EtlError::Csv(_)
            | EtlError::InvalidCoordinate(_)
            | EtlError::MissingColumn(_)
            | EtlError::Coercion { .. }
            | EtlError::InvalidFormat(_) => ErrorKind::Data,

            EtlError::Database(e) => classify_sql_state(e.code()),
        }
    }
}

/// Map a PostgreSQL SQLSTATE onto an [`ErrorKind`].
///
/// Errors without a SQLSTATE come from the client side (closed socket, protocol
/// failure) and count as connection problems.
pub fn classify_sql_state(code: Option<&SqlState>) -> ErrorKind {
    let Some(code) = code else {
        return ErrorKind::Connection;
    };

    let class = &code.code()[..2];
    match class {
        "23" => ErrorKind::ConstraintViolation,
        "22" => ErrorKind::Data,
        // connection exception, invalid authorization
        "08" | "28" => ErrorKind::Connection,
        _ => ErrorKind::Schema,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_state_classification() {
        assert_eq!(
            classify_sql_state(Some(&SqlState::UNIQUE_VIOLATION)),
            ErrorKind::ConstraintViolation
        );
        assert_eq!(
            classify_sql_state(Some(&SqlState::NOT_NULL_VIOLATION)),
            ErrorKind::ConstraintViolation
        );
        assert_eq!(
            classify_sql_state(Some(&SqlState::DUPLICATE_TABLE)),
            ErrorKind::Schema
        );
        assert_eq!(
            classify_sql_state(Some(&SqlState::UNDEFINED_COLUMN)),
            ErrorKind::Schema
        );
        assert_eq!(
            classify_sql_state(Some(&SqlState::INVALID_DATETIME_FORMAT)),
            ErrorKind::Data
        );
        assert_eq!(
            classify_sql_state(Some(&SqlState::INVALID_PASSWORD)),
            ErrorKind::Connection
        );
        assert_eq!(classify_sql_state(None), ErrorKind::Connection);
    }

    #[test]
    fn test_error_kinds() {
        let err = EtlError::TableNotInManifest {
            table: "missing".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(
            err.to_string(),
            "The table missing does not exist in the manifest"
        );

        let err = EtlError::Coercion {
            row: 3,
            column: "dt".to_string(),
            value: "yesterday".to_string(),
            target: "date",
        };
        assert_eq!(err.kind(), ErrorKind::Data);

        assert_eq!(
            EtlError::Config("bad".to_string()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(ErrorKind::ConstraintViolation.to_string(), "ConstraintViolation");
    }
}
