use crate::database::DbSession;
use crate::database::sql::{column_list, qualified, quote_ident};
use crate::error::{EtlError, Result};
use crate::models::{Manifest, TableSpec};
use crate::settings::DatabaseConfig;
use crate::utils::constants::{LATITUDE_COLUMN, LONGITUDE_COLUMN, SOURCE_SRID, TARGET_SRID};
use std::time::Instant;
use tracing::{debug, info};

/// The ordered DDL needed to provision one manifest table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDdl {
    pub create_table: String,
    pub spatial_indexes: Vec<String>,
    pub geometry_trigger: Option<GeometryTrigger>,
    pub unique_constraint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryTrigger {
    pub function: String,
    pub trigger: String,
}

impl TableDdl {
    pub fn plan(spec: &TableSpec, schema: &str) -> Result<Self> {
        let table = qualified(schema, &spec.name);

        let column_defs: Vec<String> = spec
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.dtype.sql_type()))
            .collect();
        let create_table = format!("CREATE TABLE {} ({})", table, column_defs.join(", "));

        let spatial_indexes = spec
            .columns
            .iter()
            .filter(|c| c.dtype.needs_spatial_index())
            .map(|c| {
                format!(
                    "CREATE INDEX {} ON {} USING GIST ({})",
                    quote_ident(&format!("idx_{}_{}", spec.name, c.name)),
                    table,
                    quote_ident(&c.name)
                )
            })
            .collect();

        let mut geometry_trigger = None;
        let mut unique_constraint = None;

        if !spec.is_link_table() {
            if spec.is_city_table() {
                geometry_trigger = Some(GeometryTrigger::plan(spec, schema)?);
            }

            let unique = spec.unique_columns();
            if !unique.is_empty() {
                unique_constraint = Some(format!(
                    "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
                    table,
                    quote_ident(&format!("unique_{}", spec.name)),
                    column_list(unique)
                ));
            }
        }

        Ok(Self {
            create_table,
            spatial_indexes,
            geometry_trigger,
            unique_constraint,
        })
    }

    /// Statements in execution order.
    pub fn statements(&self) -> Vec<&str> {
        let mut statements = vec![self.create_table.as_str()];
        statements.extend(self.spatial_indexes.iter().map(String::as_str));
        if let Some(trigger) = &self.geometry_trigger {
            statements.push(&trigger.function);
            statements.push(&trigger.trigger);
        }
        if let Some(constraint) = &self.unique_constraint {
            statements.push(constraint);
        }
        statements
    }
}

impl GeometryTrigger {
    /// Trigger that derives the geometry column from longitude/latitude on every write.
    pub fn plan(spec: &TableSpec, schema: &str) -> Result<Self> {
        let geometry = spec.geometry_column();
        for required in [LONGITUDE_COLUMN, LATITUDE_COLUMN, geometry] {
            if spec.column_type(required).is_none() {
                return Err(EtlError::Schema(format!(
                    "City table '{}' needs a '{}' column for its geometry trigger",
                    spec.name, required
                )));
            }
        }

        let function_name = qualified(schema, &format!("{}_generated_geometry_point", spec.name));

        let function = format!(
            "CREATE OR REPLACE FUNCTION {function_name}()
  RETURNS TRIGGER
  LANGUAGE PLPGSQL
AS $$
BEGIN
    NEW.{geometry} := ST_Transform(ST_SetSRID(ST_MakePoint(NEW.{longitude}, NEW.{latitude}, 0), {source}), {target});
    RETURN NEW;
END;
$$",
            geometry = quote_ident(geometry),
            longitude = quote_ident(LONGITUDE_COLUMN),
            latitude = quote_ident(LATITUDE_COLUMN),
            source = SOURCE_SRID,
            target = TARGET_SRID,
        );

        let trigger = format!(
            "CREATE TRIGGER {} BEFORE INSERT OR UPDATE ON {} FOR EACH ROW EXECUTE PROCEDURE {}()",
            quote_ident(&format!("tr_{}_generated_geometry_point", spec.name)),
            qualified(schema, &spec.name),
            function_name
        );

        Ok(Self { function, trigger })
    }
}

/// Create `table` as declared in the manifest, with its index, trigger and constraint.
///
/// Not idempotent: provisioning a table that already exists fails with a
/// schema error and leaves the database unchanged.
pub async fn create_table(
    config: &DatabaseConfig,
    manifest: &Manifest,
    table: &str,
    schema: &str,
) -> Result<()> {
    let start = Instant::now();
    let spec = manifest.require(table)?;
    let ddl = TableDdl::plan(spec, schema)?;

    let mut session = DbSession::acquire(config).await?;
    let result = execute_ddl(&mut session, &ddl).await;
    session.release().await;
    result?;

    info!(
        "Created table {}.{} in {:.3} seconds",
        schema,
        table,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

async fn execute_ddl(session: &mut DbSession, ddl: &TableDdl) -> Result<()> {
    let transaction = session.client_mut().transaction().await?;
    for statement in ddl.statements() {
        debug!("Executing DDL: {}", statement);
        transaction.batch_execute(statement).await?;
    }
    transaction.commit().await?;
    Ok(())
}
