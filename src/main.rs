use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, RouterOptions};
use api_shared::health::SERVICE_NAME;
use medwatch_core::{InfluxClient, PostgresPatientRepository, Settings, TelemetryService};

/// Main entry point for the MedWatch admin backend
///
/// Resolves configuration once, builds the two long-lived store handles and serves
/// the REST API (with OpenAPI/Swagger UI and the optional static admin UI).
///
/// # Environment Variables
/// - `PG_URL`, `PG_MAX_CONNECTIONS`: relational store
/// - `INFLUX_URL`, `INFLUX_TOKEN`, `INFLUX_ORG`: time-series store
/// - `MEDWATCH_RAW_BUCKET`, `MEDWATCH_PROCESSED_BUCKET`, `MEDWATCH_COERCION_POLICY`
/// - `MEDWATCH_REQUEST_TIMEOUT_SECS`: per-request deadline (default: 30)
/// - `MEDWATCH_REST_ADDR`: server address (default: "0.0.0.0:5004")
/// - `MEDWATCH_UI_DIR`: static admin UI directory (optional)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - configuration values are invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medwatch_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("medwatch_core=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    let patients = Arc::new(PostgresPatientRepository::connect_lazy(
        &settings.pg_url,
        settings.pg_max_connections,
        settings.request_timeout,
    )?);

    let influx = InfluxClient::new(&settings.influx)?;
    match influx.health().await {
        Ok(status) => tracing::info!("InfluxDB health: {}", status),
        Err(e) => tracing::warn!("InfluxDB health check failed: {}", e),
    }

    let telemetry = TelemetryService::new(Arc::new(influx), Arc::new(settings.core.clone()));
    let state = AppState::new(patients, telemetry);

    let options = RouterOptions {
        request_timeout: settings.request_timeout,
        ui_dir: settings.ui_dir.as_ref().map(PathBuf::from),
    };
    let app = api_rest::router(state, &options);

    tracing::info!(
        "-- Starting {} on {} (coercion policy: {})",
        SERVICE_NAME,
        settings.rest_addr,
        settings.core.coercion_policy()
    );

    let listener = tokio::net::TcpListener::bind(&settings.rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
