//! HTTP error mapping.
//!
//! Every failure leaves the API as `{"error": {"code", "message"}}` with one fixed
//! status per error kind. Store failures are logged here and replaced with a
//! generic message.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use medwatch_core::{CoreError, ValidationError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                "Method not allowed".to_string(),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => e.into(),
            CoreError::NotFound(_) => ApiError::NotFound("User not found".into()),
            CoreError::Conflict(id) => {
                ApiError::Conflict(format!("Patient {id} already exists"))
            }
            CoreError::InvalidConfig(detail) => ApiError::Internal(detail),
            e @ (CoreError::Database(_)
            | CoreError::TimeSeries(_)
            | CoreError::MalformedRow { .. }) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("rejected JSON body: {}", rejection.body_text());
        ApiError::BadRequest("Invalid JSON".into())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("rejected query string: {}", rejection.body_text());
        ApiError::BadRequest("Invalid query string".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medwatch_core::TimeSeriesError;

    #[test]
    fn core_errors_map_to_fixed_statuses() {
        let cases = [
            (
                CoreError::Validation(ValidationError::MissingField("name")),
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::NotFound("p1".into()), StatusCode::NOT_FOUND),
            (CoreError::Conflict("p1".into()), StatusCode::CONFLICT),
            (
                CoreError::TimeSeries(TimeSeriesError::Query("bad flux".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                CoreError::MalformedRow {
                    patient_id: "p1".into(),
                    reason: "name is NULL".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn validation_message_is_kept() {
        let err: ApiError = CoreError::Validation(ValidationError::BadDateFormat {
            field: "date_of_birth",
            value: "01/02/1990".into(),
        })
        .into();
        match err {
            ApiError::BadRequest(msg) => assert!(msg.contains("YYYY-MM-DD")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn internal_detail_is_not_echoed() {
        use http_body_util::BodyExt;

        let err: ApiError = CoreError::TimeSeries(TimeSeriesError::Query(
            "from(bucket: \"secret\")".into(),
        ))
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("\"INTERNAL\""), "{body}");
        assert!(!body.contains("secret"), "{body}");
    }

    #[tokio::test]
    async fn query_rejection_is_a_json_bad_request() {
        use axum::extract::{FromRequestParts, Query};
        use axum::http::Request;

        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Params {
            limit: Option<String>,
        }

        let (mut parts, _) = Request::builder()
            .uri("/api/gps?limit=5&limit=6")
            .body(())
            .unwrap()
            .into_parts();
        let rejection = Query::<Params>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();

        let response = ApiError::from(rejection).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
