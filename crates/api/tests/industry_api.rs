//! HTTP-level tests for the industry tree and the generic resource surface
//! exercised through it.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{
    admin_token, body_json, delete_auth, get_auth, patch_json_auth, post_json_auth, token_with,
};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn create_industry(app: &Router, body: Value) -> Value {
    let response = post_json_auth(app.clone(), "/api/industries", body, &admin_token()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn total(app: &Router, query: &str) -> i64 {
    let response = get_auth(app.clone(), &format!("/api/industries{query}"), &admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["pagination"]["total"]
        .as_i64()
        .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_industry_with_children_cannot_be_deleted(pool: PgPool) {
    let app = common::build_test_app(pool);
    let parent = create_industry(&app, json!({ "name": "Finance" })).await;
    create_industry(&app, json!({ "name": "Banking", "parentId": parent["id"] })).await;

    let response = delete_auth(
        app.clone(),
        &format!("/api/industries/{}", parent["id"]),
        &admin_token(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "HAS_DEPENDENTS");
    assert_eq!(total(&app, "").await, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_leaf_industry_delete_detaches_clients(pool: PgPool) {
    let app = common::build_test_app(pool);
    let industry = create_industry(&app, json!({ "name": "Retail" })).await;
    let response = post_json_auth(
        app.clone(),
        "/api/clients",
        json!({ "name": "Shop", "industryId": industry["id"] }),
        &admin_token(),
    )
    .await;
    let client = body_json(response).await;
    assert_eq!(client["industry"]["name"], "Retail");

    let response = delete_auth(
        app.clone(),
        &format!("/api/industries/{}", industry["id"]),
        &admin_token(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(
        app,
        &format!("/api/clients/{}", client["id"]),
        &admin_token(),
    )
    .await;
    let client = body_json(response).await;
    assert!(client["industryId"].is_null());
    assert!(client["industry"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_duplicate_external_id_is_rejected_before_write(pool: PgPool) {
    let app = common::build_test_app(pool);
    create_industry(&app, json!({ "name": "Finance", "externalId": "FIN" })).await;

    let response = post_json_auth(
        app.clone(),
        "/api/industries",
        json!({ "name": "Finance 2", "externalId": "FIN" }),
        &admin_token(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
    assert_eq!(total(&app, "").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_reparenting_under_a_descendant_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let root = create_industry(&app, json!({ "name": "Root" })).await;
    let child = create_industry(&app, json!({ "name": "Child", "parentId": root["id"] })).await;

    let uri = format!("/api/industries/{}", root["id"]);
    let response =
        patch_json_auth(app.clone(), &uri, json!({ "parentId": child["id"] }), &admin_token())
            .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["details"][0]["field"], "parentId");

    let response =
        patch_json_auth(app.clone(), &uri, json!({ "parentId": root["id"] }), &admin_token()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = patch_json_auth(app, &uri, json!({ "name": "Renamed" }), &admin_token()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["childrenCount"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_null_parent_filter_lists_roots(pool: PgPool) {
    let app = common::build_test_app(pool);
    let root = create_industry(&app, json!({ "name": "Finance" })).await;
    create_industry(&app, json!({ "name": "Banking", "parentId": root["id"] })).await;
    create_industry(&app, json!({ "name": "Retail" })).await;

    assert_eq!(total(&app, "?parentId=null").await, 2);
    assert_eq!(total(&app, &format!("?parentId={}", root["id"])).await, 1);
    assert_eq!(total(&app, "?search=bank").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_industry_is_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = get_auth(app.clone(), "/api/industries/424242", &admin_token()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = delete_auth(app, "/api/industries/424242", &admin_token()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_read_only_token_cannot_write(pool: PgPool) {
    let app = common::build_test_app(pool);
    let reader = token_with(&["industries:read"]);

    let response = post_json_auth(
        app.clone(),
        "/api/industries",
        json!({ "name": "Energy" }),
        &reader,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(app.clone(), "/api/industries", &reader).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(total(&app, "").await, 0);
}
