// ABOUTME: HTTP request handlers for entity tag operations
// ABOUTME: Tagging entities, searching associations, single and bulk delete, and reset by name

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use metatag_storage::{AdvancedSearchRequest, AdvancedSearchResponse};
use metatag_tags::{EntityTag, ResetEntityTags};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::response::{BulkResponse, DeleteResponse, EntityTagResponse, ResetResponse};
use crate::state::AppState;

const NOTHING_DELETED: &str = "No Tags found for entity";

/// Remove one tag from an entity, or all of them when `tag_id` is absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTagDeleteRequest {
    pub entity_id: String,
    #[serde(default)]
    pub tag_id: Option<i64>,
}

/// Attach a tag to an entity
pub async fn create_entity_tag(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EntityTag>,
) -> ApiResult<Json<EntityTagResponse>> {
    info!(
        "Tagging {} {} with tag {}",
        request.entity_type, request.entity_id, request.tag_id
    );
    let created = state.entity_tag_service.create(&request).await?;
    Ok(Json(EntityTagResponse::from_entity_tag(&state, created).await?))
}

/// Filter, sort and paginate entity tags
pub async fn advanced_search(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AdvancedSearchRequest>,
) -> ApiResult<Json<AdvancedSearchResponse<EntityTagResponse>>> {
    info!("Searching entity tags ({} filter(s))", request.filters.len());
    let mut response = state.entity_tag_service.advanced_search(&request).await?;

    let mut projected = Vec::with_capacity(response.results.len());
    for entity_tag in std::mem::take(&mut response.results) {
        projected.push(EntityTagResponse::from_entity_tag(&state, entity_tag).await?);
    }
    Ok(Json(response.with_results(projected)))
}

/// Delete one or all tags of an entity
pub async fn delete_entity_tags(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EntityTagDeleteRequest>,
) -> ApiResult<Json<DeleteResponse>> {
    info!("Deleting tags of entity {} (tag: {:?})", request.entity_id, request.tag_id);
    let count = state
        .entity_tag_service
        .delete(&request.entity_id, request.tag_id)
        .await?;
    if count == 0 {
        return Err(ApiError::not_found(NOTHING_DELETED));
    }
    Ok(Json(DeleteResponse { count }))
}

/// Apply several deletes, reporting each outcome
pub async fn delete_entity_tags_bulk(
    State(state): State<AppState>,
    ApiJson(requests): ApiJson<Vec<EntityTagDeleteRequest>>,
) -> Response {
    info!("Bulk deleting entity tags ({} request(s))", requests.len());
    let mut bulk = BulkResponse::default();

    for request in requests {
        match state
            .entity_tag_service
            .delete(&request.entity_id, request.tag_id)
            .await
        {
            Ok(0) => bulk.failed(request, NOTHING_DELETED.to_string()),
            Ok(count) => bulk.succeeded(request, DeleteResponse { count }),
            Err(e) => {
                warn!("Bulk delete failed for entity {}: {}", request.entity_id, e);
                bulk.failed(request, e.to_string());
            }
        }
    }

    (bulk.status(), Json(bulk)).into_response()
}

/// Replace the tags of each entity with the named groups and tags
pub async fn reset_entity_tags(
    State(state): State<AppState>,
    ApiJson(requests): ApiJson<Vec<ResetEntityTags>>,
) -> Json<Vec<ResetResponse>> {
    info!("Resetting tags of {} entit(ies)", requests.len());
    let mut results = Vec::with_capacity(requests.len());

    for request in requests {
        let response = match state.entity_tag_service.reset_entity_tags_by_name(&request).await {
            Ok(outcome) => ResetResponse::from_outcome(&state, outcome).await,
            Err(e) => Err(e.into()),
        };

        match response {
            Ok(response) => results.push(response),
            Err(e) => {
                warn!("Error resetting tags for entity {}: {}", request.entity_id, e);
                results.push(ResetResponse::failed(&request, e.to_string()));
            }
        }
    }

    Json(results)
}
