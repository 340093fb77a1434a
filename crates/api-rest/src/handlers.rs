//! Request handlers.
//!
//! Handlers only translate between HTTP and the core services: they decode input,
//! call one service operation and wrap the result. Every failure leaves through
//! [`ApiError`].

use crate::error::ApiError;
use crate::AppState;
use api_shared::{
    CreatePatientReq, DashboardView, GpsDataRes, HealthRes, HealthService, KpiRiskRes,
    ListPatientsRes, MessageRes, UpdatePatientReq, VitalSignsRes,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
};
use medwatch_core::codec::{decode_create_request, decode_update_request};
use medwatch_core::{PatientId, QueryLimit};
use serde::Deserialize;
use utoipa::IntoParams;

/// Query string of the telemetry endpoints.
///
/// Both values are kept as raw strings: a missing `patient_id` is a client error,
/// while an unparseable `limit` silently falls back to the default.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TelemetryParams {
    /// Patient whose samples are returned.
    pub patient_id: Option<String>,
    /// Maximum number of samples (default 100).
    pub limit: Option<String>,
}

/// Query string of the dashboard endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardParams {
    pub patient_id: Option<String>,
}

fn patient_id_param(raw: Option<&str>) -> Result<PatientId, ApiError> {
    raw.map(PatientId::new)
        .and_then(Result::ok)
        .ok_or_else(|| ApiError::BadRequest("Patient ID required".into()))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Liveness probe.
///
/// Always answers with the fixed healthy payload once the process is serving; it
/// does not touch either store.
#[axum::debug_handler]
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All patient records ordered by name", body = ListPatientsRes),
        (status = 500, description = "Relational store failure")
    )
)]
/// List every patient record.
///
/// Rows that cannot be decoded are skipped by the repository, so the list may be
/// shorter than the table.
#[axum::debug_handler]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<ListPatientsRes>, ApiError> {
    let records = state.patients.list().await?;
    Ok(Json(ListPatientsRes {
        users: records.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreatePatientReq,
    responses(
        (status = 201, description = "Patient created", body = MessageRes),
        (status = 400, description = "Missing field, bad date or invalid JSON"),
        (status = 409, description = "Patient id already exists"),
        (status = 500, description = "Relational store failure")
    )
)]
/// Create a patient record.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the body is not valid JSON,
/// - `patient_id`, `name`, `email`, `password` or `role` is missing, or
/// - `date_of_birth` is present and not `YYYY-MM-DD`.
///
/// Returns `409 Conflict` if the id is already taken.
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreatePatientReq>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageRes>), ApiError> {
    let Json(req) = payload?;
    let record = decode_create_request(&req)?;

    state.patients.create(&record).await?;
    tracing::info!(patient_id = %record.patient_id, "patient created");

    let body =
        MessageRes::new("User created successfully").with_patient_id(record.patient_id.into_inner());
    Ok((StatusCode::CREATED, Json(body)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "Patient record without password", body = api_shared::PatientRes),
        (status = 404, description = "Unknown patient"),
        (status = 500, description = "Relational store failure")
    )
)]
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<api_shared::PatientRes>, ApiError> {
    let patient_id = patient_id_param(Some(&id))?;
    let record = state.patients.get(&patient_id).await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "Patient identifier")),
    request_body = UpdatePatientReq,
    responses(
        (status = 200, description = "Patient updated", body = MessageRes),
        (status = 400, description = "Missing name, bad date or invalid JSON"),
        (status = 404, description = "Unknown patient"),
        (status = 500, description = "Relational store failure")
    )
)]
/// Overwrite every mutable column of a patient record.
///
/// Absent optional fields are written as NULL and an absent role as `patient`.
#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePatientReq>, JsonRejection>,
) -> Result<Json<MessageRes>, ApiError> {
    let patient_id = patient_id_param(Some(&id))?;
    let Json(req) = payload?;
    let update = decode_update_request(&req)?;

    state.patients.update(&patient_id, &update).await?;
    tracing::info!(patient_id = %patient_id, "patient updated");

    Ok(Json(MessageRes::new("User updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "Patient identifier")),
    responses(
        (status = 200, description = "Patient deleted", body = MessageRes),
        (status = 404, description = "Unknown patient"),
        (status = 500, description = "Relational store failure")
    )
)]
#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageRes>, ApiError> {
    let patient_id = patient_id_param(Some(&id))?;
    state.patients.delete(&patient_id).await?;
    tracing::info!(patient_id = %patient_id, "patient deleted");
    Ok(Json(MessageRes::new("User deleted successfully")))
}

/// `/api/users/` with an empty id.
pub async fn missing_user_id() -> ApiError {
    ApiError::BadRequest("Patient ID required".into())
}

/// `/api/users/{id}/`: any id path ending in a slash.
pub async fn invalid_user_id() -> ApiError {
    ApiError::BadRequest("Invalid patient ID".into())
}

/// Fallback for a known path hit with an unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[utoipa::path(
    get,
    path = "/api/gps",
    params(TelemetryParams),
    responses(
        (status = 200, description = "Location samples from the last 24 hours", body = GpsDataRes),
        (status = 400, description = "Missing patient_id"),
        (status = 500, description = "Time-series store failure")
    )
)]
#[axum::debug_handler]
pub async fn gps_data(
    State(state): State<AppState>,
    params: Result<Query<TelemetryParams>, QueryRejection>,
) -> Result<Json<GpsDataRes>, ApiError> {
    let Query(params) = params?;
    let patient_id = patient_id_param(params.patient_id.as_deref())?;
    let limit = QueryLimit::from_param(params.limit.as_deref());
    let gps_data = state.telemetry.locations(&patient_id, limit).await?;
    Ok(Json(GpsDataRes { gps_data }))
}

#[utoipa::path(
    get,
    path = "/api/vitals",
    params(TelemetryParams),
    responses(
        (status = 200, description = "Vital signs from the last 24 hours", body = VitalSignsRes),
        (status = 400, description = "Missing patient_id"),
        (status = 500, description = "Time-series store failure")
    )
)]
#[axum::debug_handler]
pub async fn vital_signs(
    State(state): State<AppState>,
    params: Result<Query<TelemetryParams>, QueryRejection>,
) -> Result<Json<VitalSignsRes>, ApiError> {
    let Query(params) = params?;
    let patient_id = patient_id_param(params.patient_id.as_deref())?;
    let limit = QueryLimit::from_param(params.limit.as_deref());
    let vital_signs = state.telemetry.vitals(&patient_id, limit).await?;
    Ok(Json(VitalSignsRes { vital_signs }))
}

#[utoipa::path(
    get,
    path = "/api/kpis",
    params(TelemetryParams),
    responses(
        (status = 200, description = "Risk assessments from the last 7 days", body = KpiRiskRes),
        (status = 400, description = "Missing patient_id"),
        (status = 500, description = "Time-series store failure")
    )
)]
#[axum::debug_handler]
pub async fn kpi_risk(
    State(state): State<AppState>,
    params: Result<Query<TelemetryParams>, QueryRejection>,
) -> Result<Json<KpiRiskRes>, ApiError> {
    let Query(params) = params?;
    let patient_id = patient_id_param(params.patient_id.as_deref())?;
    let limit = QueryLimit::from_param(params.limit.as_deref());
    let kpi_risk = state.telemetry.risk_assessments(&patient_id, limit).await?;
    Ok(Json(KpiRiskRes { kpi_risk }))
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    params(DashboardParams),
    responses(
        (status = 200, description = "Patient record with telemetry summary", body = DashboardView),
        (status = 400, description = "Missing patient_id"),
        (status = 404, description = "Unknown patient"),
        (status = 500, description = "Relational store failure")
    )
)]
/// Patient record plus a best-effort telemetry summary.
///
/// Telemetry failures do not fail the request; they clear `summary.complete`.
#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    params: Result<Query<DashboardParams>, QueryRejection>,
) -> Result<Json<DashboardView>, ApiError> {
    let Query(params) = params?;
    let patient_id = patient_id_param(params.patient_id.as_deref())?;
    let view = state.dashboard.build_dashboard(&patient_id).await?;
    Ok(Json(view))
}
