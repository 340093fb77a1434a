use api_rest::{router, AppState, RouterOptions};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use medwatch_core::timeseries::{FluxQuery, FluxRecord, FluxRecords};
use medwatch_core::{
    CoreConfig, InMemoryPatientRepository, TelemetryService, TelemetrySource, TimeSeriesError,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Answers every query with the same rows and remembers each query text.
#[derive(Default)]
struct ScriptedSource {
    rows: Vec<Vec<(&'static str, &'static str)>>,
    fail: bool,
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl TelemetrySource for ScriptedSource {
    async fn query(&self, query: &FluxQuery) -> Result<FluxRecords, TimeSeriesError> {
        self.seen.lock().unwrap().push(query.as_str().to_string());
        if self.fail {
            return Err(TimeSeriesError::Status {
                status: 500,
                message: "internal error from bucket my_app_raw_data".into(),
            });
        }
        let rows: Vec<_> = self
            .rows
            .iter()
            .map(|pairs| Ok(FluxRecord::from_pairs(pairs.iter().copied())))
            .collect();
        Ok(Box::new(rows.into_iter()))
    }
}

fn app_with(source: Arc<ScriptedSource>) -> Router {
    let patients = Arc::new(InMemoryPatientRepository::new());
    let telemetry = TelemetryService::new(source, Arc::new(CoreConfig::default()));
    router(AppState::new(patients, telemetry), &RouterOptions::default())
}

fn app() -> Router {
    app_with(Arc::new(ScriptedSource::default()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn ada() -> Value {
    json!({
        "patient_id": "p1",
        "name": "Ada",
        "email": "a@x.com",
        "password": "pw",
        "role": "patient"
    })
}

#[tokio::test]
async fn patient_lifecycle() {
    let app = app();

    let (status, body) = send(&app, Method::POST, "/api/users", Some(ada())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["patient_id"], "p1");
    assert_eq!(body["message"], "User created successfully");

    let (status, body) = send(&app, Method::GET, "/api/users/p1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ada");
    assert_eq!(body["role"], "patient");
    assert!(body.get("password").is_none());

    let (status, _) = send(&app, Method::DELETE, "/api/users/p1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/users/p1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn list_wraps_users_sorted_by_name() {
    let app = app();
    for (id, name) in [("p2", "Grace"), ("p1", "Ada")] {
        let mut req = ada();
        req["patient_id"] = json!(id);
        req["name"] = json!(name);
        let (status, _) = send(&app, Method::POST, "/api/users", Some(req)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, Method::GET, "/api/users", None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ada", "Grace"]);
}

#[tokio::test]
async fn create_rejects_missing_fields_bad_dates_and_bad_json() {
    let app = app();

    let mut missing_role = ada();
    missing_role.as_object_mut().unwrap().remove("role");
    let (status, _) = send(&app, Method::POST, "/api/users", Some(missing_role)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_date = ada();
    bad_date["date_of_birth"] = json!("01/02/1990");
    let (status, body) = send(&app, Method::POST, "/api/users", Some(bad_date)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/api/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["users"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn legacy_role_key_is_accepted() {
    let app = app();
    let mut req = ada();
    req.as_object_mut().unwrap().remove("role");
    req["rol_account"] = json!("doctor");

    let (status, _) = send(&app, Method::POST, "/api/users", Some(req)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, Method::GET, "/api/users/p1", None).await;
    assert_eq!(body["role"], "doctor");
}

#[tokio::test]
async fn duplicate_create_conflicts() {
    let app = app();
    send(&app, Method::POST, "/api/users", Some(ada())).await;
    let (status, body) = send(&app, Method::POST, "/api/users", Some(ada())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn update_overwrites_and_defaults_role() {
    let app = app();
    let mut req = ada();
    req["role"] = json!("doctor");
    req["gender"] = json!("F");
    send(&app, Method::POST, "/api/users", Some(req)).await;

    let update = json!({ "name": "Ada Lovelace", "date_of_birth": "1815-12-10" });
    let (status, body) = send(&app, Method::PUT, "/api/users/p1", Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User updated successfully");

    let (_, body) = send(&app, Method::GET, "/api/users/p1", None).await;
    assert_eq!(body["name"], "Ada Lovelace");
    assert_eq!(body["date_of_birth"], "1815-12-10");
    assert_eq!(body["role"], "patient");
    assert!(body["gender"].is_null());
}

#[tokio::test]
async fn update_and_delete_of_unknown_patient_are_not_found() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/users/ghost",
        Some(json!({ "name": "Nobody" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/users/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_user_id_is_bad_request() {
    let (status, _) = send(&app(), Method::GET, "/api/users/", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn id_path_with_trailing_slash_is_bad_request() {
    let app = app();
    send(&app, Method::POST, "/api/users", Some(ada())).await;

    let (status, body) = send(&app, Method::GET, "/api/users/p1/", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn malformed_query_string_is_json_bad_request() {
    let source = Arc::new(ScriptedSource::default());
    let app = app_with(source.clone());

    let uri = "/api/gps?patient_id=p1&limit=5&limit=6";
    let (status, body) = send(&app, Method::GET, uri, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(source.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn wrong_method_is_405() {
    let app = app();
    let (status, body) = send(&app, Method::DELETE, "/api/users", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"]["code"], "METHOD_NOT_ALLOWED");

    let (status, _) = send(&app, Method::POST, "/api/gps?patient_id=p1", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn gps_uses_default_and_explicit_limits() {
    let source = Arc::new(ScriptedSource {
        rows: vec![vec![
            ("_time", "2024-05-01T10:00:00Z"),
            ("patient_id", "p-1"),
            ("latitude", "19.43"),
            ("longitude", "-99.13"),
        ]],
        ..Default::default()
    });
    let app = app_with(source.clone());

    let (status, body) = send(&app, Method::GET, "/api/gps?patient_id=p-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gps_data"][0]["latitude"], 19.43);

    send(&app, Method::GET, "/api/gps?patient_id=p-1&limit=5", None).await;
    send(&app, Method::GET, "/api/gps?patient_id=p-1&limit=lots", None).await;

    let seen = source.seen.lock().unwrap();
    assert!(seen[0].ends_with("|> limit(n: 100)"));
    assert!(seen[0].contains("range(start: -24h)"));
    assert!(seen[1].ends_with("|> limit(n: 5)"));
    assert!(seen[2].ends_with("|> limit(n: 100)"));
}

#[tokio::test]
async fn telemetry_requires_patient_id() {
    let source = Arc::new(ScriptedSource::default());
    let app = app_with(source.clone());

    for uri in ["/api/gps", "/api/vitals?patient_id=", "/api/kpis?limit=3", "/api/dashboard"] {
        let (status, _) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
    assert!(source.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn kpis_use_week_window() {
    let source = Arc::new(ScriptedSource::default());
    let app = app_with(source.clone());

    let (status, body) = send(&app, Method::GET, "/api/kpis?patient_id=p1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "kpi_risk": [] }));
    assert!(source.seen.lock().unwrap()[0].contains("range(start: -7d)"));
}

#[tokio::test]
async fn time_series_failure_is_500_without_detail() {
    let source = Arc::new(ScriptedSource {
        fail: true,
        ..Default::default()
    });
    let app = app_with(source);

    let (status, body) = send(&app, Method::GET, "/api/vitals?patient_id=p1", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "INTERNAL");
    assert!(!body.to_string().contains("my_app_raw_data"));
}

#[tokio::test]
async fn dashboard_for_unknown_patient_is_404_without_telemetry_calls() {
    let source = Arc::new(ScriptedSource::default());
    let app = app_with(source.clone());

    let (status, _) = send(&app, Method::GET, "/api/dashboard?patient_id=unknown", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(source.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn dashboard_survives_time_series_outage() {
    let source = Arc::new(ScriptedSource {
        fail: true,
        ..Default::default()
    });
    let app = app_with(source);
    send(&app, Method::POST, "/api/users", Some(ada())).await;

    let (status, body) = send(&app, Method::GET, "/api/dashboard?patient_id=p1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_info"]["name"], "Ada");
    assert_eq!(body["summary"]["complete"], false);
    assert_eq!(body["summary"]["total_gps_records"], 0);
}

#[tokio::test]
async fn health_is_fixed_payload() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy", "service": "medwatch-admin" }));
}
