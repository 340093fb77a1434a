//! Conversion between flat wire payloads and typed identity records.
//!
//! Decoding is a pure transform: it never touches a store. Only field presence and
//! the date format are validated; email format and password strength are not this
//! layer's concern.

use crate::constants::{DATE_FORMAT, DEFAULT_ROLE};
use crate::error::ValidationError;
use crate::patient::{PatientRecord, PatientUpdate};
use crate::types::PatientId;
use api_shared::{CreatePatientReq, UpdatePatientReq};
use chrono::NaiveDate;

/// Decode the body of a create request.
///
/// `patient_id`, `name`, `email`, `password` and `role` are required; a field that is
/// absent or blank fails with [`ValidationError::MissingField`]. `date_of_birth` is
/// optional, but when present and non-empty it must be `YYYY-MM-DD`.
pub fn decode_create_request(raw: &CreatePatientReq) -> Result<PatientRecord, ValidationError> {
    let patient_id = PatientId::new(raw.patient_id.as_deref().unwrap_or_default())?;
    let name = required(&raw.name, "name")?;
    let email = required(&raw.email, "email")?;
    let password = required(&raw.password, "password")?;
    let role = required(&raw.role, "role")?;
    let date_of_birth = optional_date(&raw.date_of_birth, "date_of_birth")?;

    Ok(PatientRecord {
        patient_id,
        name,
        date_of_birth,
        gender: optional(&raw.gender),
        email: Some(email),
        password: Some(password),
        medical_history: optional(&raw.medical_history),
        role,
    })
}

/// Decode the body of an update request.
///
/// Updates overwrite the whole row, so absent optional fields become NULL and an
/// absent role is written as the default role. `name` backs a NOT NULL column and is
/// therefore required.
pub fn decode_update_request(raw: &UpdatePatientReq) -> Result<PatientUpdate, ValidationError> {
    let name = required(&raw.name, "name")?;
    let date_of_birth = optional_date(&raw.date_of_birth, "date_of_birth")?;

    Ok(PatientUpdate {
        name,
        date_of_birth,
        gender: optional(&raw.gender),
        email: optional(&raw.email),
        medical_history: optional(&raw.medical_history),
        role: optional(&raw.role).unwrap_or_else(|| DEFAULT_ROLE.to_string()),
    })
}

/// Parse a calendar date in the wire format.
///
/// chrono accepts unpadded months and days and signed years, so the exact
/// `DDDD-DD-DD` shape is checked first.
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let bad_format = || ValidationError::BadDateFormat {
        field,
        value: value.to_string(),
    };
    if !has_date_shape(value) {
        return Err(bad_format());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| bad_format())
}

fn has_date_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, ValidationError> {
    optional(value).ok_or(ValidationError::MissingField(field))
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

fn optional_date(
    value: &Option<String>,
    field: &'static str,
) -> Result<Option<NaiveDate>, ValidationError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_date(field, v).map(Some),
    }
}
