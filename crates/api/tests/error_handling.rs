//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server or
//! database is involved.

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use clientdesk_api::error::AppError;
use clientdesk_core::error::{CoreError, FieldError};
use http_body_util::BodyExt;
use validator::Validate;

async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Domain errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let (status, json) = error_to_response(AppError::not_found("Contract", 42)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Contract with id 42 not found");
    assert!(json.get("details").is_none());
}

#[tokio::test]
async fn invalid_fields_lists_every_field() {
    let err = AppError::Core(CoreError::InvalidFields(vec![
        FieldError::new("endDate", "End date must be after start date"),
        FieldError::new("billingRate", "Billing rate must be greater than 0"),
    ]));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    let details = json["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0]["field"], "endDate");
    assert_eq!(details[1]["field"], "billingRate");
}

#[tokio::test]
async fn precondition_and_dependents_are_400() {
    let (status, json) = error_to_response(AppError::Core(CoreError::PreconditionFailed(
        "Contract is not renewable".into(),
    )))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "PRECONDITION_FAILED");
    assert_eq!(json["error"], "Contract is not renewable");

    let (status, json) = error_to_response(AppError::Core(CoreError::HasDependents(
        "Industry has 1 child industry".into(),
    )))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "HAS_DEPENDENTS");
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let (status, json) =
        error_to_response(AppError::Core(CoreError::Conflict("duplicate".into()))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
}

#[tokio::test]
async fn unauthorized_hides_the_reason() {
    let (status, json) = error_to_response(AppError::Core(CoreError::Unauthorized(
        "Invalid or expired token".into(),
    )))
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Unauthorized");
}

#[tokio::test]
async fn forbidden_returns_403() {
    let (status, json) = error_to_response(AppError::Core(CoreError::Forbidden(
        "Missing permission: clients:delete".into(),
    )))
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn rate_limited_returns_429_with_retry_after() {
    let response = AppError::Core(CoreError::RateLimited {
        key: "ip:203.0.113.7".into(),
        reset_secs: 17,
    })
    .into_response();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()["retry-after"], "17");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"], "Too Many Requests");
    assert_eq!(json["code"], "RATE_LIMITED");
}

#[tokio::test]
async fn internal_errors_are_sanitized() {
    let (status, json) = error_to_response(AppError::Core(CoreError::Internal(
        "connection string with password".into(),
    )))
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Database and validator errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn other_database_errors_are_500() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::PoolTimedOut)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");
}

#[derive(Validate)]
struct Probe {
    #[validate(length(min = 3, message = "Too short"))]
    short_name: String,
}

#[tokio::test]
async fn validator_errors_become_camel_case_details() {
    let errors = Probe {
        short_name: "x".into(),
    }
    .validate()
    .unwrap_err();
    let err: AppError = errors.into();
    assert_matches!(err, AppError::Validation(_));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"][0]["field"], "shortName");
    assert_eq!(json["details"][0]["message"], "Too short");
}
