//! Constants used throughout the Medwatch core crate.
//!
//! Store names, measurement names and defaults live here so the query builder, the
//! repositories and the binaries agree on them.

/// Relational table holding identity records.
pub const PATIENT_TABLE: &str = "user_information";

/// Role written back when the stored role column is NULL.
pub const DEFAULT_ROLE: &str = "patient";

/// Default bucket for raw wearable telemetry (location and vitals).
pub const DEFAULT_RAW_BUCKET: &str = "my_app_raw_data";

/// Default bucket for derived analytics (risk scores).
pub const DEFAULT_PROCESSED_BUCKET: &str = "my_app_processed_data";

/// Measurement name for location fixes.
pub const GPS_MEASUREMENT: &str = "gps_data";

/// Measurement name for vital-sign readings.
pub const VITALS_MEASUREMENT: &str = "vital_signs";

/// Measurement name for risk assessments.
pub const RISK_MEASUREMENT: &str = "kpi_risk";

/// Result cap applied when the caller supplies none or an unusable one.
pub const DEFAULT_RESULT_LIMIT: u32 = 100;

/// Lookback for raw telemetry, in hours.
pub const RAW_LOOKBACK_HOURS: u32 = 24;

/// Lookback for risk scores, in days.
pub const RISK_LOOKBACK_DAYS: u32 = 7;

/// Calendar date format accepted on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
