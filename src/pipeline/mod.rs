pub mod etl;
pub mod run_all;

pub use etl::{extract_transform, run_etl, LoadReport, TransformOutput};
pub use run_all::{run_all, PipelineSummary};
