use crate::database::{create_table, update_join};
use crate::error::Result;
use crate::models::Manifest;
use crate::pipeline::{run_etl, LoadReport};
use crate::settings::{DatabaseConfig, EtlSettings};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub city: LoadReport,
    pub country: LoadReport,
    pub joined_rows: u64,
}

impl PipelineSummary {
    pub fn summary(&self) -> String {
        format!(
            "{}\n{}\nJoined {} rows",
            self.city.summary(),
            self.country.summary(),
            self.joined_rows
        )
    }
}

/// The documented end-to-end sequence: provision and load both sources, then
/// provision the link table and materialize the join. Stops at the first failure.
///
/// Source table names come from the link table's combination: the first side
/// receives the city file, the second the country file.
pub async fn run_all(
    config: &DatabaseConfig,
    manifest: &Manifest,
    link_table: &str,
    city_file: &Path,
    country_file: &Path,
    settings: &EtlSettings,
) -> Result<PipelineSummary> {
    let join = manifest.require(link_table)?.join_spec()?;
    let city_table = join.left.table.as_str();
    let country_table = join.right.table.as_str();
    let schema = settings.schema.as_str();

    info!("Step 1/6: create {}", city_table);
    create_table(config, manifest, city_table, schema).await?;

    info!("Step 2/6: load {}", city_file.display());
    let city = run_etl(config, city_table, city_file, settings).await?;

    info!("Step 3/6: create {}", country_table);
    create_table(config, manifest, country_table, schema).await?;

    info!("Step 4/6: load {}", country_file.display());
    let country = run_etl(config, country_table, country_file, settings).await?;

    info!("Step 5/6: create {}", link_table);
    create_table(config, manifest, link_table, schema).await?;

    info!("Step 6/6: join into {}", link_table);
    let joined_rows = update_join(config, manifest, link_table, schema).await?;

    Ok(PipelineSummary {
        city,
        country,
        joined_rows,
    })
}
