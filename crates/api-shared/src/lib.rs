//! # API Shared
//!
//! Wire definitions shared by every Medwatch surface.
//!
//! Contains:
//! - Request payloads and response envelopes for the REST API (`wire` module)
//! - Telemetry sample types produced by the time-series parser
//! - Shared services like `HealthService`
//!
//! Used by `medwatch-core` (which maps between these and its typed records) and by
//! `api-rest` for serialisation and OpenAPI schemas.

pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;
