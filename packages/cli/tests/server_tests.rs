// ABOUTME: Tests for the server bootstrap helpers
// ABOUTME: Covers database settings mapping, CORS wiring and the migrate command

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use metatag_cli::{build_app, database_config, migrate};
use metatag_config::Settings;
use metatag_storage::test_utils::migrated_pool;
use metatag_storage::{init, list_tables, DatabaseConfig};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tower::ServiceExt;

#[test]
fn test_database_config_follows_settings() {
    let settings = Settings {
        database_url: "sqlite://tags.db".to_string(),
        db_max_connections: 3,
        db_connect_retries: 7,
        ..Settings::default()
    };

    let config = database_config(&settings);

    assert_eq!(config.url, "sqlite://tags.db");
    assert_eq!(config.max_connections, 3);
    assert_eq!(config.retry.max_attempts, 7);
}

#[test]
fn test_zero_retries_still_attempts_once() {
    let settings = Settings {
        db_connect_retries: 0,
        ..Settings::default()
    };
    assert_eq!(database_config(&settings).retry.max_attempts, 1);
}

#[tokio::test]
async fn test_cors_origin_is_applied() {
    let settings = Settings {
        cors_origin: Some("http://localhost:3000".to_string()),
        ..Settings::default()
    };
    let app = build_app(&settings, migrated_pool().await).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/version")
                .header("origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn test_no_cors_headers_without_origin_setting() {
    let app = build_app(&Settings::default(), migrated_pool().await).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/version")
                .header("origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_invalid_cors_origin_is_rejected() {
    let settings = Settings {
        cors_origin: Some("http://bad\norigin".to_string()),
        ..Settings::default()
    };

    let err = build_app(&settings, migrated_pool().await).unwrap_err();
    assert!(err.to_string().contains("Invalid CORS origin"));
}

#[tokio::test]
async fn test_migrate_creates_schema() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite://{}", dir.path().join("metatag.db").display());
    let settings = Settings {
        database_url: url.clone(),
        ..Settings::default()
    };

    migrate(&settings).await.unwrap();
    // Running again is a no-op
    migrate(&settings).await.unwrap();

    let pool = init(&DatabaseConfig::new(url)).await.unwrap();
    assert_eq!(
        list_tables(&pool).await.unwrap(),
        vec!["entity_tags", "tag_groups", "tags"]
    );
}
