pub mod column_type;
pub mod manifest;
pub mod record_set;

pub use column_type::ColumnType;
pub use manifest::{ColumnSpec, CombinationSide, JoinSpec, Manifest, TableSpec, UniqueColumn};
pub use record_set::RecordSet;
