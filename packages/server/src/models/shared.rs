use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate that a trimmed text field is at most `max` Unicode characters.
pub fn validate_max_chars(value: &str, field: &str, max: usize) -> Result<(), AppError> {
    if value.trim().chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Validate a rating. `0` is accepted and means "no rating".
pub fn validate_rating(rating: Option<i32>) -> Result<(), AppError> {
    if let Some(r) = rating
        && !(0..=5).contains(&r)
    {
        return Err(AppError::Validation("Rating must be between 1 and 5".into()));
    }
    Ok(())
}

/// Trim, mapping blank to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
