//! Flux query construction.
//!
//! Caller-controlled values never reach the query text raw: identifiers, bucket and
//! measurement names are emitted as escaped string literals, and limits only as a
//! parsed unsigned integer.

use super::Lookback;
use crate::constants::DEFAULT_RESULT_LIMIT;
use crate::types::PatientId;
use std::fmt::Write;

/// A complete Flux program, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FluxQuery(String);

impl FluxQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FluxQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Maximum number of result rows a record query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryLimit(u32);

impl QueryLimit {
    /// Zero would return nothing, so it falls back to the default.
    pub fn new(n: u32) -> Self {
        if n == 0 {
            Self::default()
        } else {
            Self(n)
        }
    }

    /// Interpret a raw `limit` query parameter.
    ///
    /// Absent, empty or non-numeric values use the default instead of failing.
    pub fn from_param(raw: Option<&str>) -> Self {
        raw.and_then(|v| v.trim().parse::<u32>().ok())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for QueryLimit {
    fn default() -> Self {
        Self(DEFAULT_RESULT_LIMIT)
    }
}

/// Render `raw` as a double-quoted Flux string literal.
///
/// Escapes backslash, double quote and the `${` interpolation opener, and writes
/// ASCII control characters as escapes so the literal stays on one line. Everything
/// else, including non-ASCII text, passes through unchanged.
pub fn flux_string_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn source(bucket: &str, measurement: &str, patient_id: &PatientId, window: Lookback) -> String {
    format!(
        "from(bucket: {bucket})\n  \
         |> range(start: {start})\n  \
         |> filter(fn: (r) => r[\"_measurement\"] == {measurement})\n  \
         |> filter(fn: (r) => r[\"patient_id\"] == {patient})",
        bucket = flux_string_literal(bucket),
        start = window.flux_start(),
        measurement = flux_string_literal(measurement),
        patient = flux_string_literal(patient_id.as_str()),
    )
}

const PIVOT: &str =
    "|> pivot(rowKey: [\"_time\"], columnKey: [\"_field\"], valueColumn: \"_value\")";

/// Samples for one patient, one row per timestamp with every field as a column,
/// capped at `limit` rows in the engine's native order.
///
/// `limit` applies per table, so the pivoted tables (one per tag set) are merged
/// first to cap the whole result.
pub fn build_query(
    bucket: &str,
    measurement: &str,
    patient_id: &PatientId,
    window: Lookback,
    limit: QueryLimit,
) -> FluxQuery {
    FluxQuery(format!(
        "{}\n  {PIVOT}\n  |> group()\n  |> limit(n: {})",
        source(bucket, measurement, patient_id, window),
        limit.get()
    ))
}

/// Number of values of `field` in the window, as a single `_value` row.
pub fn build_count_query(
    bucket: &str,
    measurement: &str,
    field: &str,
    patient_id: &PatientId,
    window: Lookback,
) -> FluxQuery {
    FluxQuery(format!(
        "{}\n  |> filter(fn: (r) => r[\"_field\"] == {field})\n  |> group()\n  |> count()",
        source(bucket, measurement, patient_id, window),
        field = flux_string_literal(field),
    ))
}

/// The newest sample in the window, pivoted like [`build_query`].
pub fn build_latest_query(
    bucket: &str,
    measurement: &str,
    patient_id: &PatientId,
    window: Lookback,
) -> FluxQuery {
    FluxQuery(format!(
        "{}\n  {PIVOT}\n  |> group()\n  |> sort(columns: [\"_time\"], desc: true)\n  |> limit(n: 1)",
        source(bucket, measurement, patient_id, window),
    ))
}
