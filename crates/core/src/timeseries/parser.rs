//! Typed extraction from time-series records.
//!
//! The engine stores everything loosely typed, so each field is coerced from text on
//! the way out. What happens when coercion fails is an explicit [`CoercionPolicy`]
//! rather than an accident of the parsing code.

use super::record::FluxRecord;
use super::TelemetryKind;
use crate::error::{CoreError, TimeSeriesError};
use api_shared::{LocationSample, RiskAssessment, VitalSample};
use chrono::{DateTime, Utc};
use std::str::FromStr;

/// What to do with a field that is absent or cannot be coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoercionPolicy {
    /// Log and use the zero value for that field; keep the record.
    #[default]
    ZeroField,
    /// Log and drop the whole record.
    SkipRecord,
    /// Fail the whole query.
    AbortAll,
}

impl FromStr for CoercionPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "zero-field" => Ok(Self::ZeroField),
            "skip-record" => Ok(Self::SkipRecord),
            "abort-all" => Ok(Self::AbortAll),
            other => Err(CoreError::InvalidConfig(format!(
                "unknown coercion policy {other:?} (expected zero-field, skip-record or abort-all)"
            ))),
        }
    }
}

impl std::fmt::Display for CoercionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::ZeroField => "zero-field",
            Self::SkipRecord => "skip-record",
            Self::AbortAll => "abort-all",
        })
    }
}

/// Reads typed fields out of one record, remembering the first failure.
pub struct FieldReader<'a> {
    record: &'a FluxRecord,
    policy: CoercionPolicy,
    failure: Option<TimeSeriesError>,
}

impl<'a> FieldReader<'a> {
    pub fn new(record: &'a FluxRecord, policy: CoercionPolicy) -> Self {
        Self {
            record,
            policy,
            failure: None,
        }
    }

    pub fn f64(&mut self, field: &'static str) -> f64 {
        self.coerce(field, |raw| raw.parse::<f64>().ok())
    }

    /// Integers written as floats (`72.0`) are accepted when they are whole.
    pub fn i32(&mut self, field: &'static str) -> i32 {
        self.coerce(field, |raw| {
            raw.parse::<i32>().ok().or_else(|| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| v.fract() == 0.0 && *v >= i32::MIN as f64 && *v <= i32::MAX as f64)
                    .map(|v| v as i32)
            })
        })
    }

    pub fn i64(&mut self, field: &'static str) -> i64 {
        self.coerce(field, |raw| raw.parse::<i64>().ok())
    }

    pub fn string(&mut self, field: &'static str) -> String {
        self.coerce(field, |raw| Some(raw.to_string()))
    }

    /// The record's `_time`. A missing timestamp cannot be zeroed, so it is always
    /// recorded as a failure.
    pub fn timestamp(&mut self) -> DateTime<Utc> {
        match self.record.time() {
            Some(t) => t,
            None => {
                self.fail(TimeSeriesError::MissingTimestamp);
                DateTime::<Utc>::UNIX_EPOCH
            }
        }
    }

    fn coerce<T: Default>(
        &mut self,
        field: &'static str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> T {
        let raw = self.record.value_by_key(field);
        match raw.and_then(parse) {
            Some(v) => v,
            None => {
                let value = raw.unwrap_or_default().to_string();
                match self.policy {
                    CoercionPolicy::ZeroField => {
                        tracing::warn!(field, value = %value, "time-series field not coercible, using zero");
                    }
                    _ => self.fail(TimeSeriesError::Coercion { field, value }),
                }
                T::default()
            }
        }
    }

    fn fail(&mut self, err: TimeSeriesError) {
        if self.failure.is_none() {
            self.failure = Some(err);
        }
    }

    fn finish(self) -> Option<TimeSeriesError> {
        self.failure
    }
}

/// A type that can be built from one time-series record.
pub trait FromFluxRecord: Sized {
    /// Column whose absence means the record carries no sample.
    const PRIMARY_FIELD: &'static str;

    fn from_fields(fields: &mut FieldReader<'_>) -> Self;
}

impl FromFluxRecord for LocationSample {
    const PRIMARY_FIELD: &'static str = TelemetryKind::Location.primary_field();

    fn from_fields(fields: &mut FieldReader<'_>) -> Self {
        LocationSample {
            patient_id: fields.string("patient_id"),
            latitude: fields.f64(Self::PRIMARY_FIELD),
            longitude: fields.f64("longitude"),
            timestamp: fields.timestamp(),
        }
    }
}

impl FromFluxRecord for VitalSample {
    const PRIMARY_FIELD: &'static str = TelemetryKind::Vitals.primary_field();

    fn from_fields(fields: &mut FieldReader<'_>) -> Self {
        VitalSample {
            patient_id: fields.string("patient_id"),
            heart_rate: fields.i32(Self::PRIMARY_FIELD),
            blood_oxygen: fields.i32("blood_oxygen"),
            temperature: fields.f64("temperature"),
            timestamp: fields.timestamp(),
        }
    }
}

impl FromFluxRecord for RiskAssessment {
    const PRIMARY_FIELD: &'static str = TelemetryKind::Risk.primary_field();

    fn from_fields(fields: &mut FieldReader<'_>) -> Self {
        RiskAssessment {
            patient_id: fields.string("patient_id"),
            risk_score: fields.f64(Self::PRIMARY_FIELD),
            category: fields.string("category"),
            timestamp: fields.timestamp(),
        }
    }
}

/// Result of a `count()` aggregate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountRow(pub i64);

impl FromFluxRecord for CountRow {
    const PRIMARY_FIELD: &'static str = "_value";

    fn from_fields(fields: &mut FieldReader<'_>) -> Self {
        CountRow(fields.i64("_value"))
    }
}

/// Turn a record sequence into typed samples, in the order the engine returned them.
///
/// Records without their primary field are skipped under every policy. Other
/// failures follow `policy`; a missing timestamp skips the record unless the policy
/// is [`CoercionPolicy::AbortAll`]. Transport or framing errors always fail.
pub fn parse_records<T: FromFluxRecord>(
    records: impl IntoIterator<Item = Result<FluxRecord, TimeSeriesError>>,
    policy: CoercionPolicy,
) -> Result<Vec<T>, TimeSeriesError> {
    let mut parsed = Vec::new();

    for record in records {
        let record = record?;

        if record.value_by_key(T::PRIMARY_FIELD).is_none() {
            continue;
        }

        let mut fields = FieldReader::new(&record, policy);
        let sample = T::from_fields(&mut fields);

        match (fields.finish(), policy) {
            (None, _) => parsed.push(sample),
            (Some(err), CoercionPolicy::AbortAll) => return Err(err),
            (Some(err), _) => tracing::warn!("skipping time-series record: {}", err),
        }
    }

    Ok(parsed)
}
