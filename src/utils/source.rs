use crate::utils::constants::{CITY_MARKER, COUNTRY_MARKER};
use std::path::Path;

/// Which dataset a CSV file belongs to, decided from its file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    City,
    Country,
    Other,
}

impl SourceKind {
    /// `city` wins over `country` when a name mentions both. Parent
    /// directories are ignored.
    pub fn from_path(path: &Path) -> Self {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let lowered = name.to_lowercase();
        if lowered.contains(CITY_MARKER) {
            SourceKind::City
        } else if lowered.contains(COUNTRY_MARKER) {
            SourceKind::Country
        } else {
            SourceKind::Other
        }
    }

    /// Prefix applied to ambiguous temperature columns.
    pub fn column_prefix(&self) -> Option<&'static str> {
        match self {
            SourceKind::City => Some("city_"),
            SourceKind::Country => Some("country_"),
            SourceKind::Other => None,
        }
    }

    pub fn has_coordinates(&self) -> bool {
        matches!(self, SourceKind::City)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::City => write!(f, "city"),
            SourceKind::Country => write!(f, "country"),
            SourceKind::Other => write!(f, "other"),
        }
    }
}
