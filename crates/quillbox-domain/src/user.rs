//! Signup profile validation rules (display name, date of birth).

use chrono::{Datelike, NaiveDate, Utc};
use thiserror::Error;

/// Minimum display name length in characters.
pub const MIN_NAME_LEN: usize = 2;

/// Maximum display name length in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Minimum age at signup, in years.
pub const MIN_AGE_YEARS: i32 = 13;

/// Maximum age at signup, in years.
pub const MAX_AGE_YEARS: i32 = 120;

/// Rejection reason for an invalid signup profile field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    #[error("name must be between {MIN_NAME_LEN} and {MAX_NAME_LEN} characters")]
    InvalidName,
    #[error("invalid date of birth format")]
    InvalidDateOfBirth,
    #[error("age must be between {MIN_AGE_YEARS} and {MAX_AGE_YEARS} years")]
    AgeOutOfRange,
}

/// Validate and trim a display name.
pub fn validate_name(raw: &str) -> Result<String, ProfileError> {
    let name = raw.trim();
    let len = name.chars().count();
    if len < MIN_NAME_LEN || len > MAX_NAME_LEN {
        return Err(ProfileError::InvalidName);
    }
    Ok(name.to_owned())
}

/// Parse a `YYYY-MM-DD` date of birth and enforce the age bounds.
///
/// Age is the calendar-year difference, matching how the signup form has
/// always computed it (month and day are ignored).
pub fn validate_date_of_birth(raw: &str) -> Result<NaiveDate, ProfileError> {
    let dob = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ProfileError::InvalidDateOfBirth)?;
    let age = Utc::now().year() - dob.year();
    if !(MIN_AGE_YEARS..=MAX_AGE_YEARS).contains(&age) {
        return Err(ProfileError::AgeOutOfRange);
    }
    Ok(dob)
}
