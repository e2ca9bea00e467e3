//! Field-level validation helpers and the pre-flight error taxonomy.

use common::RecordId;
use thiserror::Error;

use crate::file::FileConstraintError;

/// A field failed a local validation rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A string field is shorter than its minimum length.
    #[error("field '{field}' must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    /// A numeric field failed to parse or was negative.
    #[error("field '{field}' must be a non-negative number")]
    InvalidNumber { field: &'static str },

    /// An email field is not a plausible address.
    #[error("field '{field}' is not a valid email address")]
    InvalidEmail { field: &'static str },

    /// A key in a key/value attribute list is empty.
    #[error("attribute key at position {index} is empty")]
    EmptyKey { index: usize },

    /// A key appears more than once in a key/value attribute list.
    #[error("duplicate attribute key '{key}'")]
    DuplicateKey { key: String },
}

/// A reference field points at an id outside the allowed set.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("field '{field}' references {value}, which is not in the allowed set")]
pub struct ReferenceError {
    pub field: &'static str,
    pub value: RecordId,
}

/// Any pre-flight rejection of a draft. None of these ever trigger
/// compensation: they are raised before the first write.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    File(#[from] FileConstraintError),
}

/// Checks a string field against a minimum length (in characters).
pub fn require_min_len(
    field: &'static str,
    value: &str,
    min: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() < min {
        return Err(ValidationError::TooShort { field, min });
    }
    Ok(())
}

/// Checks that an email field looks like `local@domain.tld`.
pub fn require_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let valid = value
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(ValidationError::InvalidEmail { field });
    }
    Ok(())
}

/// Parses a decimal field, requiring a finite non-negative value.
pub fn parse_non_negative(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(ValidationError::InvalidNumber { field }),
    }
}

/// Parses an integer field, requiring a non-negative value.
pub fn parse_non_negative_int(field: &'static str, raw: &str) -> Result<u32, ValidationError> {
    match raw.trim().parse::<i64>() {
        Ok(value) if (0..=i64::from(u32::MAX)).contains(&value) => Ok(value as u32),
        _ => Err(ValidationError::InvalidNumber { field }),
    }
}

/// Checks that a reference id is part of a previously fetched set.
pub fn require_known_id(
    field: &'static str,
    value: RecordId,
    known: &[RecordId],
) -> Result<(), ReferenceError> {
    if !known.contains(&value) {
        return Err(ReferenceError { field, value });
    }
    Ok(())
}

/// Checks that every key is non-empty and unique within the list.
pub fn require_unique_keys<'a, I>(keys: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = std::collections::HashSet::new();
    for (index, key) in keys.into_iter().enumerate() {
        if key.trim().is_empty() {
            return Err(ValidationError::EmptyKey { index });
        }
        if !seen.insert(key) {
            return Err(ValidationError::DuplicateKey {
                key: key.to_string(),
            });
        }
    }
    Ok(())
}
