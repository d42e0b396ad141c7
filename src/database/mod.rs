pub mod connection;
pub mod introspect;
pub mod join;
pub mod provisioner;
pub mod sql;

pub use connection::DbSession;
pub use introspect::{describe_table, fetch_description, DescribedColumn, TableDescription};
pub use join::{update_join, JoinStatement};
pub use provisioner::{create_table, TableDdl};
