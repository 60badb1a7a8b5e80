// ABOUTME: Response shapes returned by the API
// ABOUTME: Tags embed their group and entity tags embed their tag, resolved per row

use axum::http::StatusCode;
use metatag_tags::{EntityTag, ResetEntityTags, ResetOutcome, Tag, TagGroup};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub count: u64,
}

/// Tag with its group resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub tag_group_id: i64,
    pub tag_group: Option<TagGroup>,
}

impl TagResponse {
    pub async fn from_tag(state: &AppState, tag: Tag) -> ApiResult<Self> {
        let tag_group = state.tag_group_service.get(tag.tag_group_id).await?;
        Ok(Self {
            id: tag.id,
            name: tag.name,
            tag_group_id: tag.tag_group_id,
            tag_group,
        })
    }

    pub async fn from_tags(state: &AppState, tags: Vec<Tag>) -> ApiResult<Vec<Self>> {
        let mut responses = Vec::with_capacity(tags.len());
        for tag in tags {
            responses.push(Self::from_tag(state, tag).await?);
        }
        Ok(responses)
    }
}

/// Entity tag with its tag (and that tag's group) resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTagResponse {
    pub entity_id: String,
    pub entity_type: String,
    pub tag_id: i64,
    pub tag: Option<TagResponse>,
}

impl EntityTagResponse {
    pub async fn from_entity_tag(state: &AppState, entity_tag: EntityTag) -> ApiResult<Self> {
        let tag = match state.tag_service.get(entity_tag.tag_id).await? {
            Some(tag) => Some(TagResponse::from_tag(state, tag).await?),
            None => None,
        };

        Ok(Self {
            entity_id: entity_tag.entity_id,
            entity_type: entity_tag.entity_type,
            tag_id: entity_tag.tag_id,
            tag,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetResponse {
    pub entity_id: String,
    pub entity_type: String,
    pub tags: Vec<TagResponse>,
    pub errors: Vec<String>,
}

impl ResetResponse {
    pub async fn from_outcome(state: &AppState, outcome: ResetOutcome) -> ApiResult<Self> {
        Ok(Self {
            entity_id: outcome.entity_id,
            entity_type: outcome.entity_type,
            tags: TagResponse::from_tags(state, outcome.tags).await?,
            errors: outcome.errors,
        })
    }

    /// A reset that could not run at all
    pub fn failed(request: &ResetEntityTags, error: String) -> Self {
        Self {
            entity_id: request.entity_id.clone(),
            entity_type: request.entity_type.clone(),
            tags: Vec::new(),
            errors: vec![error],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessItem<Req, Res> {
    pub req: Req,
    pub res: Res,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorItem<Req> {
    pub req: Req,
    pub errors: Vec<String>,
}

/// Per-item outcome of a bulk request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkResponse<Req, Res> {
    pub success: Vec<SuccessItem<Req, Res>>,
    pub errors: Vec<ErrorItem<Req>>,
}

impl<Req, Res> Default for BulkResponse<Req, Res> {
    fn default() -> Self {
        Self {
            success: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<Req, Res> BulkResponse<Req, Res> {
    pub fn succeeded(&mut self, req: Req, res: Res) {
        self.success.push(SuccessItem { req, res });
    }

    pub fn failed(&mut self, req: Req, error: String) {
        self.errors.push(ErrorItem {
            req,
            errors: vec![error],
        });
    }

    /// 200 when nothing failed, 207 when results are mixed, 400 when everything failed
    pub fn status(&self) -> StatusCode {
        match (self.success.is_empty(), self.errors.is_empty()) {
            (false, false) => StatusCode::MULTI_STATUS,
            (true, false) => StatusCode::BAD_REQUEST,
            _ => StatusCode::OK,
        }
    }
}
