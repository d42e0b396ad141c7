use crate::database::{fetch_description, DbSession};
use crate::error::Result;
use crate::models::RecordSet;
use crate::processors::{ColumnCleaner, Deduplicator};
use crate::readers::CsvReader;
use crate::settings::{DatabaseConfig, EtlSettings};
use crate::utils::{ProgressReporter, SourceKind};
use crate::writers::PostgresWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Cleaned, deduplicated rows ready for loading.
#[derive(Debug)]
pub struct TransformOutput {
    pub source: SourceKind,
    pub records: RecordSet,
    pub rows_read: usize,
    pub duplicates_dropped: usize,
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub file: PathBuf,
    pub schema: String,
    pub table: String,
    pub source: SourceKind,
    pub rows_read: usize,
    pub duplicates_dropped: usize,
    pub rows_inserted: u64,
    pub elapsed: Duration,
}

impl LoadReport {
    pub fn summary(&self) -> String {
        format!(
            "Loaded {} ({} source) into {}.{}: {} rows read, {} duplicates dropped, {} rows inserted in {:.3} seconds",
            self.file.display(),
            self.source,
            self.schema,
            self.table,
            self.rows_read,
            self.duplicates_dropped,
            self.rows_inserted,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Extract and transform one CSV file without touching the database.
pub fn extract_transform(file_path: &Path) -> Result<TransformOutput> {
    let mut records = CsvReader::new().read_path(file_path)?;
    let rows_read = records.len();

    let source = SourceKind::from_path(file_path);
    ColumnCleaner::new(source).clean(&mut records)?;

    let duplicates_dropped = Deduplicator::new().deduplicate(&mut records);
    if duplicates_dropped > 0 {
        warn!(
            "Dropped {} duplicate rows from {}",
            duplicates_dropped,
            file_path.display()
        );
    }

    Ok(TransformOutput {
        source,
        records,
        rows_read,
        duplicates_dropped,
    })
}

/// Extract, transform and append one CSV file to `table`.
pub async fn run_etl(
    config: &DatabaseConfig,
    table: &str,
    file_path: &Path,
    settings: &EtlSettings,
) -> Result<LoadReport> {
    let start = Instant::now();
    let output = extract_transform(file_path)?;

    let mut session = DbSession::acquire(config).await?;
    let result = load(&mut session, table, &output.records, settings).await;
    session.release().await;
    let rows_inserted = result?;

    let report = LoadReport {
        file: file_path.to_path_buf(),
        schema: settings.schema.clone(),
        table: table.to_string(),
        source: output.source,
        rows_read: output.rows_read,
        duplicates_dropped: output.duplicates_dropped,
        rows_inserted,
        elapsed: start.elapsed(),
    };
    info!("{}", report.summary());
    Ok(report)
}

async fn load(
    session: &mut DbSession,
    table: &str,
    records: &RecordSet,
    settings: &EtlSettings,
) -> Result<u64> {
    let description = fetch_description(session.client(), &settings.schema, table).await?;

    let progress = ProgressReporter::new(
        records.len() as u64,
        &format!("Loading {}.{}", settings.schema, table),
        !settings.show_progress,
    );

    let writer = PostgresWriter::new().with_batch_size(settings.batch_size);
    let inserted = writer
        .append(session.client_mut(), &description, records, &progress)
        .await?;

    progress.finish_with_message(&format!("Inserted {} rows", inserted));
    Ok(inserted)
}
