pub mod column_cleaner;
pub mod deduplicator;

pub use column_cleaner::ColumnCleaner;
pub use deduplicator::Deduplicator;
