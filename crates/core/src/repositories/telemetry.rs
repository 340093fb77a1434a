//! Read-only access to patient telemetry.
//!
//! Builds one query per request, hands it to the injected [`TelemetrySource`] and
//! parses the records with the configured coercion policy.

use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::timeseries::query::{build_count_query, build_latest_query, build_query};
use crate::timeseries::{
    parse_records, CountRow, FluxQuery, FromFluxRecord, QueryLimit, TelemetryKind,
    TelemetrySource,
};
use crate::types::PatientId;
use api_shared::{LocationSample, RiskAssessment, VitalSample};
use std::sync::Arc;

#[derive(Clone)]
pub struct TelemetryService {
    source: Arc<dyn TelemetrySource>,
    cfg: Arc<CoreConfig>,
}

impl TelemetryService {
    pub fn new(source: Arc<dyn TelemetrySource>, cfg: Arc<CoreConfig>) -> Self {
        Self { source, cfg }
    }

    /// Location samples from the last 24 hours.
    pub async fn locations(
        &self,
        patient_id: &PatientId,
        limit: QueryLimit,
    ) -> CoreResult<Vec<LocationSample>> {
        self.samples(TelemetryKind::Location, patient_id, limit).await
    }

    /// Vital-sign samples from the last 24 hours.
    pub async fn vitals(
        &self,
        patient_id: &PatientId,
        limit: QueryLimit,
    ) -> CoreResult<Vec<VitalSample>> {
        self.samples(TelemetryKind::Vitals, patient_id, limit).await
    }

    /// Risk assessments from the last 7 days.
    pub async fn risk_assessments(
        &self,
        patient_id: &PatientId,
        limit: QueryLimit,
    ) -> CoreResult<Vec<RiskAssessment>> {
        self.samples(TelemetryKind::Risk, patient_id, limit).await
    }

    /// Number of samples of `kind` in its window, counted on the primary field.
    pub async fn count(&self, kind: TelemetryKind, patient_id: &PatientId) -> CoreResult<u64> {
        let query = build_count_query(
            kind.bucket(&self.cfg),
            kind.measurement(),
            kind.primary_field(),
            patient_id,
            kind.lookback(),
        );
        let rows: Vec<CountRow> = self.run(&query).await?;
        Ok(rows.iter().map(|row| row.0.max(0) as u64).sum())
    }

    /// Newest risk assessment in the window, if any.
    pub async fn latest_risk(&self, patient_id: &PatientId) -> CoreResult<Option<RiskAssessment>> {
        let kind = TelemetryKind::Risk;
        let query = build_latest_query(
            kind.bucket(&self.cfg),
            kind.measurement(),
            patient_id,
            kind.lookback(),
        );
        let rows: Vec<RiskAssessment> = self.run(&query).await?;
        Ok(rows.into_iter().next())
    }

    async fn samples<T: FromFluxRecord>(
        &self,
        kind: TelemetryKind,
        patient_id: &PatientId,
        limit: QueryLimit,
    ) -> CoreResult<Vec<T>> {
        let query = build_query(
            kind.bucket(&self.cfg),
            kind.measurement(),
            patient_id,
            kind.lookback(),
            limit,
        );
        let samples = self.run(&query).await?;
        tracing::debug!(
            patient_id = %patient_id,
            measurement = kind.measurement(),
            returned = samples.len(),
            "telemetry query complete"
        );
        Ok(samples)
    }

    async fn run<T: FromFluxRecord>(&self, query: &FluxQuery) -> CoreResult<Vec<T>> {
        let records = self.source.query(query).await?;
        Ok(parse_records(records, self.cfg.coercion_policy())?)
    }
}
