use crate::error::{EtlError, Result};
use crate::utils::constants::{DEFAULT_BATCH_SIZE, DEFAULT_SCHEMA, ENV_PREFIX};
use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use validator::Validate;

/// Credentials for the target PostgreSQL/PostGIS database.
///
/// Loaded from a JSON document with `host`, `port`, `user`, `password` and
/// `database` keys. Every key can be overridden from the environment with the
/// `CLIMATE_ETL_` prefix, e.g. `CLIMATE_ETL_PASSWORD`.
#[derive(Clone, Deserialize, Validate)]
pub struct DatabaseConfig {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1))]
    pub port: u16,

    #[validate(length(min = 1))]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[validate(length(min = 1))]
    pub database: String,
}

impl DatabaseConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EtlError::Config(format!(
                "Credentials file not found: {}",
                path.display()
            )));
        }

        let builder = Config::builder()
            .add_source(File::from(path).format(FileFormat::Json))
            .add_source(Environment::with_prefix(ENV_PREFIX));

        Self::from_builder(builder)
    }

    /// Parse credentials from an in-memory JSON document, without environment overrides.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let builder = Config::builder().add_source(File::from_str(json, FileFormat::Json));
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: ::config::ConfigBuilder<::config::builder::DefaultState>,
    ) -> Result<Self> {
        let config: DatabaseConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&self.host)
            .port(self.port)
            .user(&self.user)
            .password(&self.password)
            .dbname(&self.database)
            .application_name(env!("CARGO_PKG_NAME"));
        pg
    }

    /// `postgresql://user@host:port/database`, without the password.
    pub fn display_url(&self) -> String {
        format!(
            "postgresql://{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"********")
            .field("database", &self.database)
            .finish()
    }
}

/// Per-run options shared by every operation.
#[derive(Debug, Clone)]
pub struct EtlSettings {
    pub schema: String,
    pub batch_size: usize,
    pub show_progress: bool,
}

impl EtlSettings {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ..Self::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
}

impl Default for EtlSettings {
    fn default() -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            show_progress: false,
        }
    }
}
