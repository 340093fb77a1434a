use crate::wire::HealthRes;

/// Service name reported by the liveness endpoint.
pub const SERVICE_NAME: &str = "medwatch-admin";

/// Liveness reporting shared by the REST server and the CLI.
///
/// The payload is fixed: once the process is serving requests it is healthy. Store
/// reachability is deliberately not part of liveness.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Creates a new instance of HealthService.
    pub fn new() -> Self {
        Self
    }

    /// Returns the fixed healthy payload.
    pub fn check_health() -> HealthRes {
        HealthRes {
            status: "healthy".into(),
            service: SERVICE_NAME.into(),
        }
    }
}
