//! Field-tagged records as returned by the time-series engine.
//!
//! The engine answers in annotated CSV: `#`-prefixed annotation rows, then one or
//! more tables, each introduced by its own header row. Every table row becomes a
//! [`FluxRecord`] keyed by that table's column names.

use crate::error::TimeSeriesError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::Read;

/// One row of a query result, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FluxRecord {
    values: HashMap<String, String>,
}

impl FluxRecord {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of a column. Empty cells are nulls and come back as `None`.
    pub fn value_by_key(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The `_value` column of an unpivoted or aggregated row.
    pub fn value(&self) -> Option<&str> {
        self.value_by_key("_value")
    }

    /// The `_time` column as an instant, if present and RFC 3339.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.value_by_key("_time")
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Lazy reader over an annotated-CSV response body.
///
/// Rows are parsed on demand; nothing is buffered beyond the current table header.
/// An error table (header `error,reference`) yields [`TimeSeriesError::Query`].
pub struct AnnotatedCsvReader<R> {
    rows: csv::StringRecordsIntoIter<R>,
    header: Option<Vec<String>>,
}

impl<R: Read> AnnotatedCsvReader<R> {
    pub fn new(body: R) -> Self {
        let rows = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_reader(body)
            .into_records();
        Self { rows, header: None }
    }
}

fn is_header(row: &csv::StringRecord) -> bool {
    matches!(
        (row.get(1), row.get(2)),
        (Some("result"), Some("table")) | (Some("error"), _)
    )
}

impl<R: Read> Iterator for AnnotatedCsvReader<R> {
    type Item = Result<FluxRecord, TimeSeriesError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(e) => return Some(Err(TimeSeriesError::Csv(e))),
            };

            if row.iter().all(str::is_empty) {
                continue;
            }

            if is_header(&row) {
                self.header = Some(row.iter().map(str::to_string).collect());
                continue;
            }

            let Some(header) = &self.header else {
                tracing::warn!("time-series row before any table header, ignoring");
                continue;
            };

            if header.get(1).map(String::as_str) == Some("error") {
                let message = row.get(1).unwrap_or_default().to_string();
                return Some(Err(TimeSeriesError::Query(message)));
            }

            let record = FluxRecord::from_pairs(
                header
                    .iter()
                    .zip(row.iter())
                    .filter(|(name, _)| !name.is_empty())
                    .map(|(name, value)| (name.clone(), value.to_string())),
            );
            return Some(Ok(record));
        }
    }
}
