//! HTTP-level tests for client-scoped contracts and their lifecycle.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{admin_token, body_json, delete_auth, get_auth, patch_json_auth, post_json_auth};
use serde_json::{json, Value};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_client(app: &Router, name: &str) -> i64 {
    let response =
        post_json_auth(app.clone(), "/api/clients", json!({ "name": name }), &admin_token()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

async fn create_contract(app: &Router, client_id: i64, body: Value) -> Value {
    let response = post_json_auth(
        app.clone(),
        &format!("/api/clients/{client_id}/contracts"),
        body,
        &admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

fn contract_body() -> Value {
    json!({
        "startDate": "2025-01-01",
        "endDate": "2025-12-31",
        "billingRate": 150.0
    })
}

async fn renew(app: &Router, client_id: i64, id: i64, body: Value) -> (StatusCode, Value) {
    let response = post_json_auth(
        app.clone(),
        &format!("/api/clients/{client_id}/contracts/{id}/renew"),
        body,
        &admin_token(),
    )
    .await;
    (response.status(), body_json(response).await)
}

async fn terminate(app: &Router, client_id: i64, id: i64, reason: &str) -> (StatusCode, Value) {
    let response = post_json_auth(
        app.clone(),
        &format!("/api/clients/{client_id}/contracts/{id}/terminate"),
        json!({ "reason": reason }),
        &admin_token(),
    )
    .await;
    (response.status(), body_json(response).await)
}

// ---------------------------------------------------------------------------
// Create and list
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_contract_defaults(pool: PgPool) {
    let app = common::build_test_app(pool);
    let client_id = create_client(&app, "Acme").await;

    let contract = create_contract(&app, client_id, contract_body()).await;

    assert_eq!(contract["clientId"], client_id);
    assert_eq!(contract["client"]["name"], "Acme");
    assert_eq!(contract["status"], "ACTIVE");
    assert_eq!(contract["paymentStatus"], "PENDING");
    assert_eq!(contract["currency"], "USD");
    assert_eq!(contract["isRenewable"], true);
    assert_eq!(contract["startDate"], "2025-01-01");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_contract_lists_every_violation(pool: PgPool) {
    let app = common::build_test_app(pool);
    let client_id = create_client(&app, "Acme").await;

    let response = post_json_auth(
        app,
        &format!("/api/clients/{client_id}/contracts"),
        json!({
            "startDate": "2025-12-31",
            "endDate": "2025-01-01",
            "billingRate": -5
        }),
        &admin_token(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    let fields: Vec<&str> = json["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"endDate"));
    assert!(fields.contains(&"billingRate"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_contract_under_missing_client_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/clients/9999/contracts",
        contract_body(),
        &admin_token(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_filter_by_client_and_status(pool: PgPool) {
    let app = common::build_test_app(pool);
    let acme = create_client(&app, "Acme").await;
    let globex = create_client(&app, "Globex").await;

    let target = create_contract(&app, acme, contract_body()).await;
    let mut expired = contract_body();
    expired["status"] = json!("EXPIRED");
    create_contract(&app, acme, expired).await;
    create_contract(&app, globex, contract_body()).await;

    let response = get_auth(
        app,
        &format!("/api/contracts?clientId={acme}&status=ACTIVE"),
        &admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["id"], target["id"]);
    assert_eq!(
        json["pagination"],
        json!({ "total": 1, "pages": 1, "page": 1, "limit": 10 })
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_scoped_list_only_shows_the_clients_contracts(pool: PgPool) {
    let app = common::build_test_app(pool);
    let acme = create_client(&app, "Acme").await;
    let globex = create_client(&app, "Globex").await;
    create_contract(&app, acme, contract_body()).await;
    create_contract(&app, globex, contract_body()).await;

    // clientId in the query cannot widen the scope
    let response = get_auth(
        app,
        &format!("/api/clients/{acme}/contracts?clientId={globex}"),
        &admin_token(),
    )
    .await;

    let json = body_json(response).await;
    assert_eq!(json["pagination"]["total"], 1);
    assert_eq!(json["data"][0]["clientId"], acme);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bad_list_params_report_every_field(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get_auth(
        app,
        "/api/contracts?page=0&limit=500&status=OPEN&colour=red",
        &admin_token(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["details"].as_array().unwrap().len(), 4);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_other_clients_contract_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let acme = create_client(&app, "Acme").await;
    let globex = create_client(&app, "Globex").await;
    let contract = create_contract(&app, acme, contract_body()).await;
    let id = contract["id"].as_i64().unwrap();

    let response = get_auth(
        app.clone(),
        &format!("/api/clients/{globex}/contracts/{id}"),
        &admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (status, _) = terminate(&app, globex, id, "wrong client").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_patch_checks_merged_dates_and_transitions(pool: PgPool) {
    let app = common::build_test_app(pool);
    let client_id = create_client(&app, "Acme").await;
    let contract = create_contract(&app, client_id, contract_body()).await;
    let uri = format!("/api/clients/{client_id}/contracts/{}", contract["id"]);

    let response =
        patch_json_auth(app.clone(), &uri, json!({ "endDate": "2024-06-01" }), &admin_token())
            .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["details"][0]["field"], "endDate");

    let response =
        patch_json_auth(app.clone(), &uri, json!({ "status": "TERMINATED" }), &admin_token())
            .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "PRECONDITION_FAILED");

    let response = patch_json_auth(
        app,
        &uri,
        json!({ "status": "EXPIRED", "paymentStatus": "OVERDUE" }),
        &admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "EXPIRED");
    assert_eq!(json["paymentStatus"], "OVERDUE");
    assert_eq!(json["endDate"], "2025-12-31");
}

// ---------------------------------------------------------------------------
// Renew
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_renew_extends_contract(pool: PgPool) {
    let app = common::build_test_app(pool);
    let client_id = create_client(&app, "Acme").await;
    let id = create_contract(&app, client_id, contract_body()).await["id"]
        .as_i64()
        .unwrap();

    let (status, json) = renew(&app, client_id, id, json!({ "newEndDate": "2026-12-31" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "RENEWED");
    assert_eq!(json["endDate"], "2026-12-31");
    assert!(json["renewalDate"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_renew_non_renewable_fails_whatever_the_date(pool: PgPool) {
    let app = common::build_test_app(pool);
    let client_id = create_client(&app, "Acme").await;
    let mut body = contract_body();
    body["isRenewable"] = json!(false);
    let id = create_contract(&app, client_id, body).await["id"].as_i64().unwrap();

    for new_end in ["2030-01-01", "2020-01-01", "garbage"] {
        let (status, json) = renew(&app, client_id, id, json!({ "newEndDate": new_end })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "PRECONDITION_FAILED");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_renew_date_rules(pool: PgPool) {
    let app = common::build_test_app(pool);
    let client_id = create_client(&app, "Acme").await;
    let id = create_contract(&app, client_id, contract_body()).await["id"]
        .as_i64()
        .unwrap();

    let (status, json) = renew(&app, client_id, id, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (status, json) = renew(&app, client_id, id, json!({ "newEndDate": "2025-12-31" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "PRECONDITION_FAILED");
}

// ---------------------------------------------------------------------------
// Terminate
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_terminate_then_terminate_again(pool: PgPool) {
    let app = common::build_test_app(pool);
    let client_id = create_client(&app, "Acme").await;
    let id = create_contract(&app, client_id, contract_body()).await["id"]
        .as_i64()
        .unwrap();

    let (status, json) = terminate(&app, client_id, id, "  ab ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (status, json) = terminate(&app, client_id, id, "Client relocated").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "TERMINATED");
    assert_eq!(json["terminationReason"], "Client relocated");
    assert!(json["terminationDate"].is_string());

    let (status, json) = terminate(&app, client_id, id, "Again").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "PRECONDITION_FAILED");

    let (status, json) = renew(&app, client_id, id, json!({ "newEndDate": "2030-01-01" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "PRECONDITION_FAILED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_active_assignment_blocks_termination(pool: PgPool) {
    let app = common::build_test_app(pool);
    let client_id = create_client(&app, "Acme").await;
    let id = create_contract(&app, client_id, contract_body()).await["id"]
        .as_i64()
        .unwrap();

    let response = post_json_auth(
        app.clone(),
        "/api/service-assignments",
        json!({ "contractId": id, "name": "Quarterly review" }),
        &admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let assignment_id = body_json(response).await["id"].as_i64().unwrap();

    let (status, json) = terminate(&app, client_id, id, "Budget cut").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");

    let response = patch_json_auth(
        app.clone(),
        &format!("/api/service-assignments/{assignment_id}"),
        json!({ "status": "COMPLETED" }),
        &admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = terminate(&app, client_id, id, "Budget cut").await;
    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_client_with_contracts_cannot_be_deleted(pool: PgPool) {
    let app = common::build_test_app(pool);
    let client_id = create_client(&app, "Acme").await;
    let id = create_contract(&app, client_id, contract_body()).await["id"]
        .as_i64()
        .unwrap();

    let response = delete_auth(app.clone(), &format!("/api/clients/{client_id}"), &admin_token()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "HAS_DEPENDENTS");

    let response = delete_auth(
        app.clone(),
        &format!("/api/clients/{client_id}/contracts/{id}"),
        &admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "success": true }));

    let response = delete_auth(app, &format!("/api/clients/{client_id}"), &admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
}
