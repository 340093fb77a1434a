//! Per-patient dashboard: the identity record plus a short telemetry summary.

use crate::error::{CoreError, CoreResult};
use crate::repositories::patients::PatientRepository;
use crate::repositories::telemetry::TelemetryService;
use crate::timeseries::TelemetryKind;
use crate::types::PatientId;
use api_shared::{DashboardSummary, DashboardView};
use std::sync::Arc;

#[derive(Clone)]
pub struct DashboardService {
    patients: Arc<dyn PatientRepository>,
    telemetry: TelemetryService,
}

impl DashboardService {
    pub fn new(patients: Arc<dyn PatientRepository>, telemetry: TelemetryService) -> Self {
        Self {
            patients,
            telemetry,
        }
    }

    /// Compose the dashboard for one patient.
    ///
    /// An unknown patient fails with [`CoreError::NotFound`] before any telemetry is
    /// queried. The summary is best effort: a failing telemetry query leaves its
    /// fields at zero and clears `complete` instead of failing the request.
    pub async fn build_dashboard(&self, patient_id: &PatientId) -> CoreResult<DashboardView> {
        let record = self.patients.get(patient_id).await?;

        let (gps, vitals, latest) = tokio::join!(
            self.telemetry.count(TelemetryKind::Location, patient_id),
            self.telemetry.count(TelemetryKind::Vitals, patient_id),
            self.telemetry.latest_risk(patient_id),
        );

        let mut summary = DashboardSummary {
            complete: true,
            ..DashboardSummary::default()
        };

        match gps {
            Ok(n) => summary.total_gps_records = n,
            Err(err) => summary_degraded(&mut summary, patient_id, "gps count", &err),
        }
        match vitals {
            Ok(n) => summary.total_vitals = n,
            Err(err) => summary_degraded(&mut summary, patient_id, "vitals count", &err),
        }
        match latest {
            Ok(Some(risk)) => {
                summary.latest_risk_score = Some(risk.risk_score);
                summary.latest_risk_category = Some(risk.category);
                summary.latest_risk_at = Some(risk.timestamp);
            }
            Ok(None) => {}
            Err(err) => summary_degraded(&mut summary, patient_id, "latest risk", &err),
        }

        Ok(DashboardView {
            user_info: record.into(),
            summary,
        })
    }
}

fn summary_degraded(
    summary: &mut DashboardSummary,
    patient_id: &PatientId,
    part: &'static str,
    err: &CoreError,
) {
    tracing::warn!(patient_id = %patient_id, part, "dashboard summary incomplete: {}", err);
    summary.complete = false;
}
