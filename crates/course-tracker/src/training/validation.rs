//! Field rules applied before a record reaches the store.
//!
//! Every check is a pure function: it either returns the accepted (and, where useful,
//! normalized) value or a [`ValidationError`] carrying the message shown to callers.

use std::ops::RangeInclusive;

use serde_json::Value;

use super::domain::{CertificateType, Position, RegistrationStatus};

pub const MIN_FULL_NAME_CHARS: usize = 3;
pub const MIN_PHONE_DIGITS: usize = 10;
pub const MIN_TITLE_CHARS: usize = 3;
pub const DURATION_HOURS: RangeInclusive<i64> = 1..=10_000;
pub const PROGRESS_PERCENT: RangeInclusive<i64> = 0..=100;

const PHONE_FORMATTING: [char; 5] = ['+', '-', ' ', '(', ')'];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("full name must be at least 3 characters long and contain only letters and spaces")]
    InvalidFullName,
    #[error("phone number must contain at least 10 digits; only + - ( ) and spaces are allowed as formatting")]
    InvalidPhone,
    #[error("position must be one of: {}", Position::options())]
    InvalidPosition,
    #[error("course title must be at least 3 characters long")]
    InvalidTitle,
    #[error("duration must be a whole number of hours between 1 and 10000")]
    InvalidDuration,
    #[error("certificate type must be one of: {}", CertificateType::options())]
    InvalidCertificateType,
    #[error("progress must be between 0 and 100, got {0}")]
    ProgressOutOfRange(i64),
    #[error("status must be one of: {}", RegistrationStatus::options())]
    UnknownStatus(String),
    #[error("search query must not be empty")]
    EmptySearchQuery,
}

/// Removes the formatting characters people type into phone numbers.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !PHONE_FORMATTING.contains(ch))
        .collect()
}

/// Accepts a phone whose normalized form is all digits and long enough; returns that form.
pub fn validate_phone(raw: &str) -> Result<String, ValidationError> {
    let digits = normalize_phone(raw);
    if digits.chars().count() >= MIN_PHONE_DIGITS && digits.chars().all(|ch| ch.is_ascii_digit())
    {
        Ok(digits)
    } else {
        Err(ValidationError::InvalidPhone)
    }
}

pub fn validate_full_name(raw: &str) -> Result<(), ValidationError> {
    let letters = raw.chars().filter(|ch| !ch.is_whitespace()).count();
    let well_formed = raw.chars().all(|ch| ch.is_alphabetic() || ch.is_whitespace());

    if raw.chars().count() >= MIN_FULL_NAME_CHARS && letters >= MIN_FULL_NAME_CHARS && well_formed
    {
        Ok(())
    } else {
        Err(ValidationError::InvalidFullName)
    }
}

pub fn parse_position(raw: &str) -> Result<Position, ValidationError> {
    Position::from_label(raw).ok_or(ValidationError::InvalidPosition)
}

pub fn parse_certificate_type(raw: &str) -> Result<CertificateType, ValidationError> {
    CertificateType::from_label(raw).ok_or(ValidationError::InvalidCertificateType)
}

/// Returns the trimmed title when it is long enough.
pub fn validate_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.chars().count() >= MIN_TITLE_CHARS {
        Ok(title.to_string())
    } else {
        Err(ValidationError::InvalidTitle)
    }
}

/// Accepts an integer or an integer-valued string within [`DURATION_HOURS`].
pub fn parse_duration_hours(raw: &Value) -> Result<u16, ValidationError> {
    let hours = match raw {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or(ValidationError::InvalidDuration)?;

    if DURATION_HOURS.contains(&hours) {
        u16::try_from(hours).map_err(|_| ValidationError::InvalidDuration)
    } else {
        Err(ValidationError::InvalidDuration)
    }
}

pub fn validate_progress(value: i64) -> Result<u8, ValidationError> {
    if PROGRESS_PERCENT.contains(&value) {
        u8::try_from(value).map_err(|_| ValidationError::ProgressOutOfRange(value))
    } else {
        Err(ValidationError::ProgressOutOfRange(value))
    }
}

pub fn parse_status(raw: &str) -> Result<RegistrationStatus, ValidationError> {
    RegistrationStatus::from_label(raw.trim())
        .ok_or_else(|| ValidationError::UnknownStatus(raw.to_string()))
}

pub fn validate_search_query(raw: &str) -> Result<&str, ValidationError> {
    let query = raw.trim();
    if query.is_empty() {
        Err(ValidationError::EmptySearchQuery)
    } else {
        Ok(query)
    }
}

/// Unwraps an optional payload field, treating blank strings as missing.
pub(crate) fn required<'a>(
    value: &'a Option<String>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match value.as_deref() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ValidationError::MissingField(field)),
    }
}
