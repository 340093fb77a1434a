//! Identity records held in the relational store.

use crate::constants::{DATE_FORMAT, DEFAULT_ROLE};
use crate::types::PatientId;
use api_shared::PatientRes;
use chrono::NaiveDate;

/// Identity and medical record of one patient.
///
/// Optional columns are `None` when NULL in storage. `password` is write-only: it is
/// populated on the create path and is always `None` on records read back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientRecord {
    pub patient_id: PatientId,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub medical_history: Option<String>,
    pub role: String,
}

impl PatientRecord {
    /// The same record as it would be seen on a read path.
    pub fn without_password(mut self) -> Self {
        self.password = None;
        self
    }
}

/// The mutable columns of an identity record, written as a whole on update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientUpdate {
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub medical_history: Option<String>,
    pub role: String,
}

impl PatientUpdate {
    /// Apply this overwrite to an existing record, keeping its id and password.
    pub fn apply_to(self, record: &mut PatientRecord) {
        record.name = self.name;
        record.date_of_birth = self.date_of_birth;
        record.gender = self.gender;
        record.email = self.email;
        record.medical_history = self.medical_history;
        record.role = self.role;
    }
}

/// Resolve a possibly-NULL stored role.
pub fn role_or_default(role: Option<String>) -> String {
    role.unwrap_or_else(|| DEFAULT_ROLE.to_string())
}

impl From<PatientRecord> for PatientRes {
    fn from(record: PatientRecord) -> Self {
        PatientRes {
            patient_id: record.patient_id.into_inner(),
            name: record.name,
            date_of_birth: record
                .date_of_birth
                .map(|d| d.format(DATE_FORMAT).to_string()),
            gender: record.gender,
            email: record.email,
            medical_history: record.medical_history,
            role: record.role,
        }
    }
}
