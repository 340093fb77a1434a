//! # API REST
//!
//! REST API implementation for MedWatch.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, status codes, CORS, timeouts)
//!
//! Uses `api-shared` for wire types and `medwatch-core` for every data operation.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;

pub use error::ApiError;

use axum::{
    routing::{any, get},
    Router,
};
use handlers::*;
use medwatch_core::{DashboardService, PatientRepository, TelemetryService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server.
///
/// Holds the long-lived store handles built once at startup. Cloning is cheap; all
/// clones share the same pools.
#[derive(Clone)]
pub struct AppState {
    pub patients: Arc<dyn PatientRepository>,
    pub telemetry: TelemetryService,
    pub dashboard: DashboardService,
}

impl AppState {
    pub fn new(patients: Arc<dyn PatientRepository>, telemetry: TelemetryService) -> Self {
        let dashboard = DashboardService::new(patients.clone(), telemetry.clone());
        Self {
            patients,
            telemetry,
            dashboard,
        }
    }
}

/// Transport settings for [`router`].
#[derive(Clone, Debug)]
pub struct RouterOptions {
    /// Deadline for a whole request; the handler future is dropped when it passes.
    pub request_timeout: Duration,
    /// Directory served for paths no route matches.
    pub ui_dir: Option<PathBuf>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            ui_dir: None,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_users,
        handlers::create_user,
        handlers::get_user,
        handlers::update_user,
        handlers::delete_user,
        handlers::gps_data,
        handlers::vital_signs,
        handlers::kpi_risk,
        handlers::dashboard,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::CreatePatientReq,
        api_shared::UpdatePatientReq,
        api_shared::PatientRes,
        api_shared::ListPatientsRes,
        api_shared::MessageRes,
        api_shared::LocationSample,
        api_shared::VitalSample,
        api_shared::RiskAssessment,
        api_shared::GpsDataRes,
        api_shared::VitalSignsRes,
        api_shared::KpiRiskRes,
        api_shared::DashboardSummary,
        api_shared::DashboardView,
    ))
)]
pub struct ApiDoc;

/// Build the full HTTP surface.
pub fn router(state: AppState, options: &RouterOptions) -> Router {
    let app = Router::new()
        .route("/health", get(health).fallback(method_not_allowed))
        .route(
            "/api/users",
            get(list_users).post(create_user).fallback(method_not_allowed),
        )
        .route("/api/users/", any(missing_user_id))
        .route(
            "/api/users/:id",
            get(get_user)
                .put(update_user)
                .delete(delete_user)
                .fallback(method_not_allowed),
        )
        .route("/api/users/:id/", any(invalid_user_id))
        .route("/api/gps", get(gps_data).fallback(method_not_allowed))
        .route("/api/vitals", get(vital_signs).fallback(method_not_allowed))
        .route("/api/kpis", get(kpi_risk).fallback(method_not_allowed))
        .route("/api/dashboard", get(dashboard).fallback(method_not_allowed))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state);

    let app = match &options.ui_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(TimeoutLayer::new(options.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
