use crate::database::DbSession;
use crate::database::sql::{column_list, qualified, quote_ident};
use crate::error::Result;
use crate::models::{JoinSpec, Manifest};
use crate::settings::DatabaseConfig;
use std::time::Instant;
use tracing::{debug, info};

const LEFT_ALIAS: &str = "l";
const RIGHT_ALIAS: &str = "r";

/// `INSERT INTO link (...) SELECT ... FROM left JOIN right ON <keys>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinStatement {
    pub sql: String,
}

impl JoinStatement {
    pub fn build(join: &JoinSpec, link_table: &str, schema: &str) -> Self {
        let projection: Vec<String> = join
            .left
            .columns
            .iter()
            .map(|c| format!("{}.{}", LEFT_ALIAS, quote_ident(c)))
            .chain(
                join.right
                    .columns
                    .iter()
                    .map(|c| format!("{}.{}", RIGHT_ALIAS, quote_ident(c))),
            )
            .collect();

        let condition: Vec<String> = join
            .keys
            .iter()
            .map(|k| {
                let key = quote_ident(k);
                format!("{}.{} = {}.{}", LEFT_ALIAS, key, RIGHT_ALIAS, key)
            })
            .collect();

        let sql = format!(
            "INSERT INTO {} ({}) SELECT {} FROM {} AS {} JOIN {} AS {} ON {}",
            qualified(schema, link_table),
            column_list(join.target_columns()),
            projection.join(", "),
            qualified(schema, &join.left.table),
            LEFT_ALIAS,
            qualified(schema, &join.right.table),
            RIGHT_ALIAS,
            condition.join(" AND ")
        );

        Self { sql }
    }
}

/// Append the natural join of the link table's two sources to the link table.
///
/// Each call inserts the full join again; rows are only kept unique if the
/// link table carries a constraint of its own.
pub async fn update_join(
    config: &DatabaseConfig,
    manifest: &Manifest,
    link_table: &str,
    schema: &str,
) -> Result<u64> {
    let start = Instant::now();
    let spec = manifest.require(link_table)?;
    let join = spec.join_spec()?;
    let statement = JoinStatement::build(&join, link_table, schema);
    debug!("Join statement: {}", statement.sql);

    let session = DbSession::acquire(config).await?;
    let result = session.client().execute(statement.sql.as_str(), &[]).await;
    session.release().await;
    let inserted = result?;

    info!(
        "Updated joined table {}.{} with {} rows from {} and {} in {:.3} seconds",
        schema,
        link_table,
        inserted,
        join.left.table,
        join.right.table,
        start.elapsed().as_secs_f64()
    );
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, EtlError};
    use crate::models::manifest::tests::SAMPLE_MANIFEST;

    #[test]
    fn test_join_statement() {
        let manifest = Manifest::from_json_str(SAMPLE_MANIFEST).unwrap();
        let join = manifest
            .require("link_temperature_city_country")
            .unwrap()
            .join_spec()
            .unwrap();

        let statement = JoinStatement::build(&join, "link_temperature_city_country", "public");

        assert_eq!(
            statement.sql,
            "INSERT INTO \"public\".\"link_temperature_city_country\" \
             (\"dt\", \"city\", \"country\", \"city_averagetemperature\", \"country_averagetemperature\") \
             SELECT l.\"dt\", l.\"city\", l.\"country\", l.\"city_averagetemperature\", r.\"country_averagetemperature\" \
             FROM \"public\".\"global_and_temperatures_by_major_city\" AS l \
             JOIN \"public\".\"global_and_temperatures_by_country\" AS r \
             ON l.\"dt\" = r.\"dt\" AND l.\"country\" = r.\"country\""
        );
    }

    #[test]
    fn test_custom_join_keys() {
        let mut manifest = Manifest::from_json_str(SAMPLE_MANIFEST).unwrap();
        let link = manifest
            .tables
            .iter_mut()
            .find(|t| t.name == "link_temperature_city_country")
            .unwrap();
        link.join_on = vec!["dt".to_string()];

        let statement = JoinStatement::build(&link.join_spec().unwrap(), &link.name, "public");
        assert!(statement.sql.ends_with("ON l.\"dt\" = r.\"dt\""));
    }

    #[tokio::test]
    async fn test_missing_link_table_fails_before_connecting() {
        let config = DatabaseConfig::from_json_str(
            r#"{"host": "127.0.0.1", "port": 1, "user": "u", "password": "p", "database": "d"}"#,
        )
        .unwrap();
        let manifest = Manifest::from_json_str(SAMPLE_MANIFEST).unwrap();

        let err = update_join(&config, &manifest, "link_missing", "public")
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::TableNotInManifest { .. }));

        // A manifest table without a combination is not a joinable link table
        let err = update_join(&config, &manifest, "global_and_temperatures_by_country", "public")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }
}
