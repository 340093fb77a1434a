//! Store-facing repositories.
//!
//! Two independent stores back the system: identity records in a relational database
//! and telemetry in a time-series engine. Each is wrapped in a long-lived, cloneable
//! handle constructed once at startup and injected into every caller.

pub mod memory;
pub mod patients;
pub mod telemetry;
