// ABOUTME: HTTP-level tests for the Metatag API router
// ABOUTME: Drives the real router with oneshot requests against an in-memory database

use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use metatag_api::{create_router, with_middleware, AppState};
use metatag_config::Settings;
use metatag_storage::test_utils::migrated_pool;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app() -> Router {
    test_app_with(Settings::default()).await
}

async fn test_app_with(settings: Settings) -> Router {
    let pool = migrated_pool().await;
    create_router(AppState::new(pool, settings))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
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

async fn create_group(app: &Router, name: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/tag_groups",
        Some(json!({"name": name, "description": format!("{name} group")})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["id"].as_i64().unwrap()
}

async fn create_tag(app: &Router, name: &str, tag_group_id: i64) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/tags",
        Some(json!({"name": name, "tag_group_id": tag_group_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_reports_masked_settings_and_tables() {
    let settings = Settings {
        database_password: Some("hunter2".to_string()),
        ..Settings::default()
    };
    let app = test_app_with(settings).await;

    let (status, body) = send(&app, "GET", "/api/v1/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["settings"]["DATABASE_PASSWORD"], "*******");
    assert_eq!(body["settings"]["APP_VERSION"], "-----");
    assert_eq!(
        body["settings"]["DB_TABLES"],
        json!(["entity_tags", "tag_groups", "tags"])
    );
}

#[tokio::test]
async fn test_version() {
    let app = test_app_with(Settings {
        app_version: Some("1.4.2".to_string()),
        ..Settings::default()
    })
    .await;

    let (status, body) = send(&app, "GET", "/api/v1/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"version": "1.4.2"}));
}

#[tokio::test]
async fn test_tag_group_lifecycle() {
    let app = test_app().await;
    let id = create_group(&app, "languages").await;

    let (status, body) = send(&app, "GET", &format!("/api/v1/tag_groups/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"id": id, "name": "languages", "description": "languages group"})
    );

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/v1/tag_groups/{id}"),
        Some(json!({"name": "langs"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "langs");
    assert_eq!(body["description"], Value::Null);

    let (status, body) = send(&app, "DELETE", &format!("/api/v1/tag_groups/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 1}));

    let (status, _) = send(&app, "DELETE", &format!("/api/v1/tag_groups/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_not_found_uses_error_envelope() {
    let app = test_app().await;

    let (status, body) = send(&app, "GET", "/api/v1/tag_groups/999", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({
            "error": {
                "code": 404,
                "message": "Not Found",
                "details": "Tag group not found",
                "request": "GET /api/v1/tag_groups/999"
            }
        })
    );
}

#[tokio::test]
async fn test_update_missing_tag_group_is_not_found() {
    let app = test_app().await;
    let (status, _) = send(
        &app,
        "PUT",
        "/api/v1/tag_groups/999",
        Some(json!({"name": "ghost"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_tag_group_is_bad_request() {
    let app = test_app().await;
    create_group(&app, "languages").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/tag_groups",
        Some(json!({"name": "languages"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 400);
    assert_eq!(body["error"]["request"], "POST /api/v1/tag_groups");
}

#[tokio::test]
async fn test_tag_with_unknown_group_is_bad_request() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/tags",
        Some(json!({"name": "rust", "tag_group_id": 404})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["details"].as_str().unwrap().contains("Reference"));
}

#[tokio::test]
async fn test_malformed_body_uses_error_envelope() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/tags",
        Some(json!({"name": "rust"})),
    )
    .await;

    assert!(status.is_client_error());
    assert_eq!(body["error"]["code"], status.as_u16());
    assert_eq!(body["error"]["request"], "POST /api/v1/tags");
}

#[tokio::test]
async fn test_tag_response_embeds_group() {
    let app = test_app().await;
    let group_id = create_group(&app, "languages").await;
    let tag_id = create_tag(&app, "rust", group_id).await;

    let (status, body) = send(&app, "GET", &format!("/api/v1/tags/{tag_id}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "rust");
    assert_eq!(body["tag_group"]["name"], "languages");
}

#[tokio::test]
async fn test_delete_missing_tag_is_not_found() {
    let app = test_app().await;
    let group_id = create_group(&app, "languages").await;
    let tag_id = create_tag(&app, "rust", group_id).await;

    let (status, body) = send(&app, "DELETE", &format!("/api/v1/tags/{tag_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 1}));

    let (status, body) = send(&app, "DELETE", &format!("/api/v1/tags/{tag_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["details"], "Tag not found");
}

#[tokio::test]
async fn test_tag_search_starts_with_and_totals() {
    let app = test_app().await;
    let group_id = create_group(&app, "words").await;
    for name in ["Capybara", "capital", "CAPSTONE", "escape"] {
        create_tag(&app, name, group_id).await;
    }

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/tags/advanced_search",
        Some(json!({
            "filters": [{
                "field": "name",
                "field_type": "string",
                "filter_type": "starts_with",
                "values": ["cap"]
            }],
            "sorts": [{"field": "name", "sort_type": "asc"}],
            "limit": 2
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["count_total"], 3);
    assert_eq!(body["offset"], 0);
    assert_eq!(body["results"][0]["name"], "CAPSTONE");
    assert_eq!(body["results"][0]["tag_group"]["name"], "words");
}

#[tokio::test]
async fn test_search_on_unknown_field_is_bad_request() {
    let app = test_app().await;
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/tag_groups/advanced_search",
        Some(json!({"sorts": [{"field": "colour", "direction": "desc"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_tags_with_no_entities() {
    let app = test_app().await;
    let group_id = create_group(&app, "languages").await;
    create_tag(&app, "cobol", group_id).await;

    let (status, body) = send(&app, "POST", "/api/v1/tags/delete_tags_with_no_entities", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 1}));

    let (_, body) = send(&app, "POST", "/api/v1/tags/delete_tags_with_no_entities", None).await;
    assert_eq!(body, json!({"count": 0}));
}

async fn reset(app: &Router, entity_id: &str, tag_groups: Value) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/entity_tags/reset",
        Some(json!([{
            "entity_id": entity_id,
            "entity_type": "repository",
            "tag_groups": tag_groups
        }])),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body
}

async fn tag_id_by_name(app: &Router, name: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/tags/advanced_search",
        Some(json!({
            "filters": [{"field": "name", "filter_type": "equals", "values": [name]}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count_total"], 1);
    body["results"][0]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_repository_tagging_scenario() {
    let app = test_app().await;

    let body = reset(
        &app,
        "/org/repo1",
        json!([
            {"tag_group_name": "language", "tag_names": ["java", "python"]},
            {"tag_group_name": "bu", "tag_names": ["bu-1"]}
        ]),
    )
    .await;
    assert_eq!(body[0]["entity_id"], "/org/repo1");
    assert_eq!(body[0]["tags"].as_array().unwrap().len(), 3);
    assert_eq!(body[0]["errors"], json!([]));
    assert_eq!(body[0]["tags"][0]["name"], "java");
    assert_eq!(body[0]["tags"][0]["tag_group"]["name"], "language");

    // python stays referenced by another entity
    reset(
        &app,
        "/org/repo2",
        json!([{"tag_group_name": "language", "tag_names": ["python"]}]),
    )
    .await;

    let java_id = tag_id_by_name(&app, "java").await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/entity_tags/advanced_search",
        Some(json!({
            "filters": [{
                "field": "tag_id",
                "field_type": "number",
                "filter_type": "equals",
                "values": [java_id.to_string()]
            }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count_total"], 1);
    assert_eq!(body["results"][0]["entity_id"], "/org/repo1");
    assert_eq!(body["results"][0]["tag"]["name"], "java");
    assert_eq!(body["results"][0]["tag"]["tag_group"]["name"], "language");

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/entity_tags/delete/bulk",
        Some(json!([{"entity_id": "/org/repo1"}])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"][0]["res"], json!({"count": 3}));
    assert_eq!(body["errors"], json!([]));

    let (status, body) = send(&app, "POST", "/api/v1/tags/delete_tags_with_no_entities", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 2}));

    let (_, body) = send(&app, "POST", "/api/v1/tags/advanced_search", Some(json!({}))).await;
    assert_eq!(body["count_total"], 1);
    assert_eq!(body["results"][0]["name"], "python");
}

#[tokio::test]
async fn test_single_entity_tag_delete() {
    let app = test_app().await;
    reset(
        &app,
        "/org/repo1",
        json!([{"tag_group_name": "languages", "tag_names": ["rust", "go", "zig"]}]),
    )
    .await;
    let rust_id = tag_id_by_name(&app, "rust").await;

    let delete_rust = json!({"entity_id": "/org/repo1", "tag_id": rust_id});
    let (status, body) = send(&app, "POST", "/api/v1/entity_tags/delete", Some(delete_rust.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 1}));

    let (status, body) = send(&app, "POST", "/api/v1/entity_tags/delete", Some(delete_rust)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["details"], "No Tags found for entity");

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/entity_tags/delete",
        Some(json!({"entity_id": "/org/repo1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"count": 2}));
}

#[tokio::test]
async fn test_bulk_reset_reports_failed_item_and_keeps_others() {
    let pool = migrated_pool().await;
    // Associating `poison` breaks a deferred foreign key, so that entity's reset fails at COMMIT
    for statement in [
        "CREATE TABLE audit_parents (id INTEGER PRIMARY KEY)",
        "CREATE TABLE reset_audit (parent_id INTEGER REFERENCES audit_parents(id) DEFERRABLE INITIALLY DEFERRED)",
        r#"
        CREATE TRIGGER audit_poison AFTER INSERT ON entity_tags
        WHEN NEW.tag_id IN (SELECT id FROM tags WHERE name = 'poison')
        BEGIN
            INSERT INTO reset_audit (parent_id) VALUES (-1);
        END
        "#,
    ] {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    let app = create_router(AppState::new(pool, Settings::default()));

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/entity_tags/reset",
        Some(json!([
            {
                "entity_id": "/org/repo1",
                "entity_type": "repository",
                "tag_groups": [{"tag_group_name": "languages", "tag_names": ["rust"]}]
            },
            {
                "entity_id": "/org/repo2",
                "entity_type": "repository",
                "tag_groups": [{"tag_group_name": "languages", "tag_names": ["poison"]}]
            }
        ])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["entity_id"], "/org/repo1");
    assert_eq!(body[0]["tags"][0]["name"], "rust");
    assert_eq!(body[0]["errors"], json!([]));
    assert_eq!(body[1]["entity_id"], "/org/repo2");
    assert_eq!(body[1]["tags"], json!([]));
    assert_eq!(body[1]["errors"].as_array().unwrap().len(), 1);

    let (_, body) = send(
        &app,
        "POST",
        "/api/v1/entity_tags/advanced_search",
        Some(json!({
            "filters": [{"field": "entity_id", "filter_type": "equals", "values": ["/org/repo2"]}]
        })),
    )
    .await;
    assert_eq!(body["count_total"], 0);
}

#[tokio::test]
async fn test_reset_reports_item_errors() {
    let app = test_app().await;
    let topics = create_group(&app, "topics").await;
    create_tag(&app, "rust", topics).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/entity_tags/reset",
        Some(json!([{
            "entity_id": "/org/repo1",
            "entity_type": "repository",
            "tag_groups": [{"tag_group_name": "languages", "tag_names": ["rust", "go"]}]
        }])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["tags"][0]["name"], "go");
    assert_eq!(
        body[0]["errors"],
        json!(["Error creating tag: rust - Tag rust already exists in another group"])
    );
}

#[tokio::test]
async fn test_create_entity_tag_embeds_tag() {
    let app = test_app().await;
    let group_id = create_group(&app, "languages").await;
    let tag_id = create_tag(&app, "rust", group_id).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/entity_tags",
        Some(json!({"entity_id": "/org/repo2", "entity_type": "repository", "tag_id": tag_id})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tag"]["name"], "rust");
    assert_eq!(body["tag"]["tag_group"]["name"], "languages");
}

#[tokio::test]
async fn test_bulk_delete_statuses() {
    let app = test_app().await;
    let group_id = create_group(&app, "languages").await;
    let tag_id = create_tag(&app, "rust", group_id).await;
    send(
        &app,
        "POST",
        "/api/v1/entity_tags",
        Some(json!({"entity_id": "/org/repo1", "entity_type": "repository", "tag_id": tag_id})),
    )
    .await;

    let (status, body) = send(&app, "POST", "/api/v1/entity_tags/delete/bulk", Some(json!([]))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": [], "errors": []}));

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/entity_tags/delete/bulk",
        Some(json!([
            {"entity_id": "/org/repo1", "tag_id": tag_id},
            {"entity_id": "/org/missing"}
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(body["success"][0]["res"], json!({"count": 1}));
    assert_eq!(body["errors"][0]["req"]["entity_id"], "/org/missing");
    assert_eq!(body["errors"][0]["errors"], json!(["No Tags found for entity"]));

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/entity_tags/delete/bulk",
        Some(json!([{"entity_id": "/org/repo1"}])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_panic_becomes_internal_error_envelope() {
    async fn explode() -> &'static str {
        panic!("boom")
    }

    let app = with_middleware(Router::new().route("/boom", get(explode)));

    let (status, body) = send(&app, "GET", "/boom", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], 500);
    assert_eq!(body["error"]["request"], "GET /boom");
    assert!(!body["error"]["details"].as_str().unwrap().contains("boom"));
}
