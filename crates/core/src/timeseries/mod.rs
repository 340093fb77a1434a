//! Time-series access: query construction, transport and record parsing.
//!
//! Telemetry comes in three kinds. Raw wearable signals (location, vitals) are
//! high-frequency and only interesting for a short trailing window; risk scores are
//! produced daily by the analytics pipeline and looked at over a longer one.

pub mod parser;
pub mod query;
pub mod record;
pub mod source;

pub use parser::{parse_records, CoercionPolicy, CountRow, FieldReader, FromFluxRecord};
pub use query::{FluxQuery, QueryLimit};
pub use record::{AnnotatedCsvReader, FluxRecord};
pub use source::{FluxRecords, InfluxClient, TelemetrySource};

use crate::config::CoreConfig;
use crate::constants::{
    GPS_MEASUREMENT, RAW_LOOKBACK_HOURS, RISK_LOOKBACK_DAYS, RISK_MEASUREMENT, VITALS_MEASUREMENT,
};

/// Trailing window a query restricts itself to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    Hours(u32),
    Days(u32),
}

impl Lookback {
    /// Relative Flux duration literal, e.g. `-24h`.
    pub fn flux_start(self) -> String {
        match self {
            Lookback::Hours(h) => format!("-{h}h"),
            Lookback::Days(d) => format!("-{d}d"),
        }
    }
}

/// The measurement kinds this system reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryKind {
    Location,
    Vitals,
    Risk,
}

impl TelemetryKind {
    pub fn measurement(self) -> &'static str {
        match self {
            TelemetryKind::Location => GPS_MEASUREMENT,
            TelemetryKind::Vitals => VITALS_MEASUREMENT,
            TelemetryKind::Risk => RISK_MEASUREMENT,
        }
    }

    pub fn lookback(self) -> Lookback {
        match self {
            TelemetryKind::Location | TelemetryKind::Vitals => Lookback::Hours(RAW_LOOKBACK_HOURS),
            TelemetryKind::Risk => Lookback::Days(RISK_LOOKBACK_DAYS),
        }
    }

    /// Field that must be present for a record to count as a sample.
    pub const fn primary_field(self) -> &'static str {
        match self {
            TelemetryKind::Location => "latitude",
            TelemetryKind::Vitals => "heart_rate",
            TelemetryKind::Risk => "risk_score",
        }
    }

    pub fn bucket(self, cfg: &CoreConfig) -> &str {
        match self {
            TelemetryKind::Location | TelemetryKind::Vitals => cfg.raw_bucket(),
            TelemetryKind::Risk => cfg.processed_bucket(),
        }
    }
}
