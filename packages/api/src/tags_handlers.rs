// ABOUTME: HTTP request handlers for tag operations
// ABOUTME: Responses embed each tag's group; includes orphan cleanup

use axum::{
    extract::{Path, State},
    Json,
};
use metatag_storage::{AdvancedSearchRequest, AdvancedSearchResponse};
use metatag_tags::TagInput;
use tracing::info;

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::response::{DeleteResponse, TagResponse};
use crate::state::AppState;

const NOT_FOUND: &str = "Tag not found";

/// Create a new tag in an existing group
pub async fn create_tag(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TagInput>,
) -> ApiResult<Json<TagResponse>> {
    info!("Creating tag: {} (group: {})", request.name, request.tag_group_id);
    let tag = state.tag_service.create(&request).await?;
    Ok(Json(TagResponse::from_tag(&state, tag).await?))
}

/// Get a single tag by ID
pub async fn get_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<i64>,
) -> ApiResult<Json<TagResponse>> {
    info!("Getting tag: {}", tag_id);
    let tag = state
        .tag_service
        .get(tag_id)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(Json(TagResponse::from_tag(&state, tag).await?))
}

/// Replace a tag
pub async fn update_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<i64>,
    ApiJson(request): ApiJson<TagInput>,
) -> ApiResult<Json<TagResponse>> {
    info!("Updating tag: {}", tag_id);
    let tag = state
        .tag_service
        .update(tag_id, &request)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(Json(TagResponse::from_tag(&state, tag).await?))
}

/// Delete a tag
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    info!("Deleting tag: {}", tag_id);
    let count = state.tag_service.delete(tag_id).await?;
    if count == 0 {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    Ok(Json(DeleteResponse { count }))
}

/// Filter, sort and paginate tags
pub async fn advanced_search(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AdvancedSearchRequest>,
) -> ApiResult<Json<AdvancedSearchResponse<TagResponse>>> {
    info!("Searching tags ({} filter(s))", request.filters.len());
    let mut response = state.tag_service.advanced_search(&request).await?;
    let tags = std::mem::take(&mut response.results);
    let projected = TagResponse::from_tags(&state, tags).await?;
    Ok(Json(response.with_results(projected)))
}

/// Delete every tag that is not attached to any entity
pub async fn delete_tags_with_no_entities(
    State(state): State<AppState>,
) -> ApiResult<Json<DeleteResponse>> {
    info!("Deleting tags with no entities");
    let count = state
        .tag_service
        .delete_tags_with_no_entities()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(DeleteResponse { count }))
}
