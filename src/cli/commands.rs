use crate::cli::args::{Cli, Commands};
use crate::database::{create_table, describe_table, update_join};
use crate::error::{EtlError, Result};
use crate::models::Manifest;
use crate::pipeline::{run_all, run_etl};
use crate::settings::{DatabaseConfig, EtlSettings};
use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::{error, info, Level};

/// Run one CLI command. This is the boundary where failures are logged; the
/// error is still returned so the process can exit non-zero.
pub async fn run(cli: Cli) -> Result<()> {
    if let Err(e) = init_logging(cli.verbose, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    let settings = EtlSettings::new(cli.schema.clone())
        .with_batch_size(cli.batch_size)
        .with_progress(cli.log_file.is_none());

    let result = execute(&cli, &settings).await;
    if let Err(e) = &result {
        log_failure(e);
    }
    result
}

async fn execute(cli: &Cli, settings: &EtlSettings) -> Result<()> {
    let config = DatabaseConfig::from_path(&cli.config)?;
    let schema = settings.schema.as_str();

    match &cli.command {
        Commands::CreateTable { table } => {
            let manifest = Manifest::from_path(&cli.manifest)?;
            create_table(&config, &manifest, table, schema).await?;
            println!("SUCCESS: Created table {}.{}", schema, table);
        }

        Commands::Etl { table, file } => {
            let report = run_etl(&config, table, file, settings).await?;
            println!("SUCCESS: {}", report.summary());
        }

        Commands::UpdateJoin { link_table } => {
            let manifest = Manifest::from_path(&cli.manifest)?;
            let inserted = update_join(&config, &manifest, link_table, schema).await?;
            println!(
                "SUCCESS: Inserted {} rows into joined table {}.{}",
                inserted, schema, link_table
            );
        }

        Commands::Inspect { table } => {
            let description = describe_table(&config, table, schema).await?;
            println!("{}", description.summary());

            let manifest = Manifest::from_path(&cli.manifest)?;
            match manifest.find(table) {
                Some(spec) => {
                    let problems = description.diff(spec);
                    if problems.is_empty() {
                        println!("✅ Table matches the manifest");
                    } else {
                        println!("⚠️  Table differs from the manifest:");
                        for problem in problems {
                            println!("  - {}", problem);
                        }
                    }
                }
                None => println!("Table {} is not declared in the manifest", table),
            }
        }

        Commands::RunAll {
            city_file,
            country_file,
            link_table,
        } => {
            let manifest = Manifest::from_path(&cli.manifest)?;
            info!("Running full pipeline into schema {}", schema);
            let summary = run_all(
                &config,
                &manifest,
                link_table,
                city_file,
                country_file,
                settings,
            )
            .await?;
            println!("{}", summary.summary());
            println!("Pipeline complete!");
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| EtlError::Config(format!("Cannot install log subscriber: {}", e)))
}

fn log_failure(err: &EtlError) {
    error!("FAIL [{}]: {}", err.kind(), err);

    let mut source = err.source();
    while let Some(cause) = source {
        error!("  caused by: {}", cause);
        source = cause.source();
    }
}
