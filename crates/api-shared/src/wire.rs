//! JSON payloads exchanged over the REST API.
//!
//! Patient payloads are flat and string-typed: every field arrives as an optional
//! string and is validated by the core codec. Telemetry samples are already typed,
//! since they are produced server-side from the time-series store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /api/users`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct CreatePatientReq {
    pub patient_id: Option<String>,
    pub name: Option<String>,
    /// Calendar date, `YYYY-MM-DD`.
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub medical_history: Option<String>,
    #[serde(alias = "rol_account")]
    pub role: Option<String>,
}

/// Body of `PUT /api/users/{id}`. The identifier comes from the path.
#[derive(Clone, Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdatePatientReq {
    pub name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub medical_history: Option<String>,
    #[serde(alias = "rol_account")]
    pub role: Option<String>,
}

/// A patient record as returned on read paths. There is no password field.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct PatientRes {
    pub patient_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub medical_history: Option<String>,
    pub role: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct ListPatientsRes {
    pub users: Vec<PatientRes>,
}

/// Acknowledgement for create, update and delete.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
}

impl MessageRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            patient_id: None,
        }
    }

    pub fn with_patient_id(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }
}

/// One location fix.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct LocationSample {
    pub patient_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// One vital-signs reading.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct VitalSample {
    pub patient_id: String,
    pub heart_rate: i32,
    /// Percentage.
    pub blood_oxygen: i32,
    pub temperature: f64,
    pub timestamp: DateTime<Utc>,
}

/// One risk score emitted by the analytics pipeline.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct RiskAssessment {
    pub patient_id: String,
    pub risk_score: f64,
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct GpsDataRes {
    pub gps_data: Vec<LocationSample>,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct VitalSignsRes {
    pub vital_signs: Vec<VitalSample>,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct KpiRiskRes {
    pub kpi_risk: Vec<RiskAssessment>,
}

/// Time-series summary attached to a dashboard.
///
/// `complete` is false when at least one summary query failed; the affected
/// fields then keep their zero/absent values.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub total_gps_records: u64,
    pub total_vitals: u64,
    pub latest_risk_score: Option<f64>,
    pub latest_risk_category: Option<String>,
    pub latest_risk_at: Option<DateTime<Utc>>,
    pub complete: bool,
}

/// Body of `GET /api/dashboard`.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct DashboardView {
    pub user_info: PatientRes,
    pub summary: DashboardSummary,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct HealthRes {
    pub status: String,
    pub service: String,
}
