use crate::utils::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_CONFIG_FILE, DEFAULT_LINK_TABLE, DEFAULT_MANIFEST_FILE,
    DEFAULT_SCHEMA,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "climate-etl")]
#[command(about = "Load climate temperature CSV datasets into PostgreSQL/PostGIS")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE, help = "Database credentials JSON file")]
    pub config: PathBuf,

    #[arg(short, long, global = true, default_value = DEFAULT_MANIFEST_FILE, help = "Table manifest JSON file")]
    pub manifest: PathBuf,

    #[arg(short, long, global = true, default_value = DEFAULT_SCHEMA)]
    pub schema: String,

    #[arg(long, global = true, default_value_t = DEFAULT_BATCH_SIZE, help = "Rows per INSERT statement")]
    pub batch_size: usize,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a table declared in the manifest
    CreateTable {
        #[arg(help = "Table name as it appears in the manifest")]
        table: String,
    },

    /// Extract a CSV file, clean it and append it to a table
    Etl {
        #[arg(help = "Existing target table")]
        table: String,

        #[arg(help = "CSV file; 'city' or 'country' in the path selects the cleaning rules")]
        file: PathBuf,
    },

    /// Insert the natural join of the two source tables into a link table
    UpdateJoin {
        #[arg(default_value = DEFAULT_LINK_TABLE)]
        link_table: String,
    },

    /// Show a table's live columns and compare them with the manifest
    Inspect {
        table: String,
    },

    /// Provision, load and join everything in one go
    RunAll {
        #[arg(long, help = "City temperature CSV file")]
        city_file: PathBuf,

        #[arg(long, help = "Country temperature CSV file")]
        country_file: PathBuf,

        #[arg(long, default_value = DEFAULT_LINK_TABLE)]
        link_table: String,
    },
}
