pub mod postgres_writer;

pub use postgres_writer::{CellValue, PostgresWriter};
