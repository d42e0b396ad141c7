/// Default file locations
pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_MANIFEST_FILE: &str = "climate_table.json";

/// Environment variable prefix for credential overrides
pub const ENV_PREFIX: &str = "CLIMATE_ETL";

/// Database defaults
pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_LINK_TABLE: &str = "link_temperature_city_country";

/// Processing defaults
pub const DEFAULT_BATCH_SIZE: usize = 1000;
/// PostgreSQL caps bind parameters per statement at u16::MAX
pub const MAX_BIND_PARAMETERS: usize = 65_535;

/// Spatial reference systems
pub const SOURCE_SRID: i32 = 4326;
pub const TARGET_SRID: i32 = 3347;

/// Column names the geometry trigger and the join rely on
pub const LONGITUDE_COLUMN: &str = "longitude";
pub const LATITUDE_COLUMN: &str = "latitude";
pub const GEOMETRY_COLUMN: &str = "geometry";
pub const DATE_COLUMN: &str = "dt";
pub const COUNTRY_COLUMN: &str = "country";

/// Name fragments that drive table and source classification
pub const CITY_MARKER: &str = "city";
pub const COUNTRY_MARKER: &str = "country";
pub const LINK_MARKER: &str = "link";
pub const TEMPERATURE_MARKER: &str = "temperature";

/// Accepted date layouts, tried in order
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
