// ABOUTME: HTTP request handlers for tag group operations
// ABOUTME: Create, read, replace, delete and advanced search of tag groups

use axum::{
    extract::{Path, State},
    Json,
};
use metatag_storage::{AdvancedSearchRequest, AdvancedSearchResponse};
use metatag_tags::{TagGroup, TagGroupInput};
use tracing::info;

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::response::DeleteResponse;
use crate::state::AppState;

const NOT_FOUND: &str = "Tag group not found";

/// Create a new tag group
pub async fn create_tag_group(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TagGroupInput>,
) -> ApiResult<Json<TagGroup>> {
    info!("Creating tag group: {}", request.name);
    let tag_group = state.tag_group_service.create(&request).await?;
    Ok(Json(tag_group))
}

/// Get a single tag group by ID
pub async fn get_tag_group(
    State(state): State<AppState>,
    Path(tag_group_id): Path<i64>,
) -> ApiResult<Json<TagGroup>> {
    info!("Getting tag group: {}", tag_group_id);
    state
        .tag_group_service
        .get(tag_group_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

/// Replace a tag group
pub async fn update_tag_group(
    State(state): State<AppState>,
    Path(tag_group_id): Path<i64>,
    ApiJson(request): ApiJson<TagGroupInput>,
) -> ApiResult<Json<TagGroup>> {
    info!("Updating tag group: {}", tag_group_id);
    state
        .tag_group_service
        .update(tag_group_id, &request)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))
}

/// Delete a tag group
pub async fn delete_tag_group(
    State(state): State<AppState>,
    Path(tag_group_id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    info!("Deleting tag group: {}", tag_group_id);
    let count = state.tag_group_service.delete(tag_group_id).await?;
    if count == 0 {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    Ok(Json(DeleteResponse { count }))
}

/// Filter, sort and paginate tag groups
pub async fn advanced_search(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AdvancedSearchRequest>,
) -> ApiResult<Json<AdvancedSearchResponse<TagGroup>>> {
    info!("Searching tag groups ({} filter(s))", request.filters.len());
    let response = state.tag_group_service.advanced_search(&request).await?;
    Ok(Json(response))
}
