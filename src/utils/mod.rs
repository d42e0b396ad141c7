pub mod constants;
pub mod coordinates;
pub mod progress;
pub mod source;

pub use constants::*;
pub use coordinates::clean_coordinate;
pub use progress::ProgressReporter;
pub use source::SourceKind;
