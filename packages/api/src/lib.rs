// ABOUTME: HTTP API layer for Metatag providing REST endpoints and routing
// ABOUTME: All routes live under /api/v1 and share the error envelope middleware

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

pub mod entity_tags_handlers;
pub mod error;
pub mod general_handlers;
pub mod response;
pub mod state;
pub mod tag_groups_handlers;
pub mod tags_handlers;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Prefix every route is nested under
pub const API_PREFIX: &str = "/api/v1";

/// Creates the tag groups API router
pub fn create_tag_groups_router() -> Router<AppState> {
    Router::new()
        .route("/tag_groups", post(tag_groups_handlers::create_tag_group))
        .route(
            "/tag_groups/advanced_search",
            post(tag_groups_handlers::advanced_search),
        )
        .route(
            "/tag_groups/{tag_group_id}",
            get(tag_groups_handlers::get_tag_group)
                .put(tag_groups_handlers::update_tag_group)
                .delete(tag_groups_handlers::delete_tag_group),
        )
}

/// Creates the tags API router
pub fn create_tags_router() -> Router<AppState> {
    Router::new()
        .route("/tags", post(tags_handlers::create_tag))
        .route("/tags/advanced_search", post(tags_handlers::advanced_search))
        .route(
            "/tags/delete_tags_with_no_entities",
            post(tags_handlers::delete_tags_with_no_entities),
        )
        .route(
            "/tags/{tag_id}",
            get(tags_handlers::get_tag)
                .put(tags_handlers::update_tag)
                .delete(tags_handlers::delete_tag),
        )
}

/// Creates the entity tags API router
pub fn create_entity_tags_router() -> Router<AppState> {
    Router::new()
        .route("/entity_tags", post(entity_tags_handlers::create_entity_tag))
        .route(
            "/entity_tags/advanced_search",
            post(entity_tags_handlers::advanced_search),
        )
        .route(
            "/entity_tags/delete",
            post(entity_tags_handlers::delete_entity_tags),
        )
        .route(
            "/entity_tags/delete/bulk",
            post(entity_tags_handlers::delete_entity_tags_bulk),
        )
        .route("/entity_tags/reset", post(entity_tags_handlers::reset_entity_tags))
}

/// Creates the health and version router
pub fn create_general_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(general_handlers::health_check))
        .route("/version", get(general_handlers::version))
}

/// Wrap a router with tracing, panic recovery and error envelope stamping
pub fn with_middleware(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(middleware::from_fn(error::request_context))
        .layer(TraceLayer::new_for_http())
}

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(create_general_router())
        .merge(create_tag_groups_router())
        .merge(create_tags_router())
        .merge(create_entity_tags_router());

    with_middleware(Router::new().nest(API_PREFIX, api).with_state(state))
}
