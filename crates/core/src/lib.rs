//! # MedWatch Core
//!
//! Core business logic for the MedWatch patient monitoring backend.
//!
//! This crate owns the data operations behind the admin API:
//! - Patient identity records in PostgreSQL (`user_information`)
//! - Telemetry queries against InfluxDB: locations, vital signs and risk scores
//! - Request decoding, query building and annotated-CSV parsing
//! - Dashboard composition
//!
//! **No API concerns**: HTTP routing, status codes and service wiring belong in
//! `api-rest` and the `medwatch-run` binary.

pub mod codec;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod patient;
pub mod repositories;
pub mod timeseries;
pub mod types;

pub use config::{CoreConfig, InfluxSettings, Settings};
pub use dashboard::DashboardService;
pub use error::{CoreError, CoreResult, TimeSeriesError, ValidationError};
pub use patient::{PatientRecord, PatientUpdate};
pub use repositories::memory::InMemoryPatientRepository;
pub use repositories::patients::{PatientRepository, PostgresPatientRepository};
pub use repositories::telemetry::TelemetryService;
pub use timeseries::{CoercionPolicy, InfluxClient, QueryLimit, TelemetryKind, TelemetrySource};
pub use types::PatientId;
