use crate::error::{EtlError, Result};

/// Normalize a latitude/longitude string carrying a compass suffix.
///
/// `"45.2N"` becomes `"45.2"` and `"10.5W"` becomes `"-10.5"`. West and south
/// are negative. Values without a direction letter come back trimmed and
/// otherwise unchanged, and an empty value stays empty.
///
/// # Examples
/// ```
/// use climate_etl::utils::clean_coordinate;
///
/// assert_eq!(clean_coordinate("43.7N").unwrap(), "43.7");
/// assert_eq!(clean_coordinate("79.4W").unwrap(), "-79.4");
/// ```
pub fn clean_coordinate(value: &str) -> Result<String> {
    let trimmed = value.trim();

    let Some(last) = trimmed.chars().last() else {
        return Ok(String::new());
    };

    if !last.is_ascii_alphabetic() {
        return Ok(trimmed.to_string());
    }

    let negative = match last.to_ascii_uppercase() {
        'N' | 'E' => false,
        'S' | 'W' => true,
        _ => {
            return Err(EtlError::InvalidCoordinate(format!(
                "Unknown direction '{}' in '{}'",
                last, value
            )))
        }
    };

    let magnitude = trimmed[..trimmed.len() - 1].trim();
    if magnitude.is_empty() {
        return Err(EtlError::InvalidCoordinate(format!(
            "Missing magnitude in '{}'",
            value
        )));
    }

    if negative {
        Ok(format!("-{}", magnitude))
    } else {
        Ok(magnitude.to_string())
    }
}
