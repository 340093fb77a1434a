use anyhow::Context;
use api_shared::{GpsDataRes, KpiRiskRes, ListPatientsRes, PatientRes, VitalSignsRes};
use clap::{Parser, Subcommand, ValueEnum};
use medwatch_core::{
    DashboardService, InfluxClient, PatientId, PatientRepository, PostgresPatientRepository,
    QueryLimit, Settings, TelemetryService,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "medwatch")]
#[command(about = "MedWatch patient monitoring CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Patient identity records
    Users {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Telemetry samples for one patient
    Telemetry {
        /// Which measurement to read
        kind: TelemetryArg,
        /// Patient identifier
        patient_id: String,
        /// Maximum number of samples (default 100)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Patient record with telemetry summary
    Dashboard {
        /// Patient identifier
        patient_id: String,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List all patients
    List,
    /// Show one patient
    Get {
        /// Patient identifier
        patient_id: String,
    },
    /// Delete one patient
    Delete {
        /// Patient identifier
        patient_id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TelemetryArg {
    /// Location fixes, last 24 hours
    Gps,
    /// Vital signs, last 24 hours
    Vitals,
    /// Risk assessments, last 7 days
    Kpis,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn telemetry_service(settings: &Settings) -> anyhow::Result<TelemetryService> {
    let client = InfluxClient::new(&settings.influx).context("building InfluxDB client")?;
    Ok(TelemetryService::new(
        Arc::new(client),
        Arc::new(settings.core.clone()),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    let patients = Arc::new(PostgresPatientRepository::connect_lazy(
        &settings.pg_url,
        settings.pg_max_connections,
        settings.request_timeout,
    )?);

    match cli.command {
        Commands::Users { command } => match command {
            UserCommands::List => {
                let users = patients.list().await?;
                if users.is_empty() {
                    eprintln!("No patients found.");
                }
                print_json(&ListPatientsRes {
                    users: users.into_iter().map(Into::into).collect(),
                })?;
            }
            UserCommands::Get { patient_id } => {
                let record = patients.get(&PatientId::new(patient_id)?).await?;
                print_json(&PatientRes::from(record))?;
            }
            UserCommands::Delete { patient_id } => {
                let patient_id = PatientId::new(patient_id)?;
                patients.delete(&patient_id).await?;
                println!("Deleted patient {patient_id}");
            }
        },
        Commands::Telemetry {
            kind,
            patient_id,
            limit,
        } => {
            let telemetry = telemetry_service(&settings)?;
            let patient_id = PatientId::new(patient_id)?;
            let limit = limit.map(QueryLimit::new).unwrap_or_default();
            match kind {
                TelemetryArg::Gps => print_json(&GpsDataRes {
                    gps_data: telemetry.locations(&patient_id, limit).await?,
                })?,
                TelemetryArg::Vitals => print_json(&VitalSignsRes {
                    vital_signs: telemetry.vitals(&patient_id, limit).await?,
                })?,
                TelemetryArg::Kpis => print_json(&KpiRiskRes {
                    kpi_risk: telemetry.risk_assessments(&patient_id, limit).await?,
                })?,
            }
        }
        Commands::Dashboard { patient_id } => {
            let telemetry = telemetry_service(&settings)?;
            let dashboard = DashboardService::new(patients, telemetry);
            let view = dashboard
                .build_dashboard(&PatientId::new(patient_id)?)
                .await?;
            print_json(&view)?;
        }
    }

    Ok(())
}
