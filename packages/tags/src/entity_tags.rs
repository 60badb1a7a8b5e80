// ABOUTME: Entity tag service: associating external entities with tags
// ABOUTME: Includes the transactional reset that rebuilds an entity's tags from names

use std::sync::Arc;

use metatag_storage::{
    AdvancedSearchRequest, AdvancedSearchResponse, Repository, StorageError, StorageResult,
};
use sqlx::{Connection, Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::tag_groups::TagGroupService;
use crate::tags::TagService;
use crate::types::{EntityTag, EntityTagKey, ResetEntityTags, ResetOutcome, Tag, TagGroup};

pub struct EntityTagService {
    pool: SqlitePool,
    repository: Repository<EntityTag>,
    tag_groups: Arc<TagGroupService>,
    tags: Arc<TagService>,
}

impl EntityTagService {
    pub fn new(pool: SqlitePool, tag_groups: Arc<TagGroupService>, tags: Arc<TagService>) -> Self {
        Self {
            pool,
            repository: Repository::new(),
            tag_groups,
            tags,
        }
    }

    pub async fn create(&self, entity_tag: &EntityTag) -> StorageResult<EntityTag> {
        debug!(
            "Tagging {} {} with tag {}",
            entity_tag.entity_type, entity_tag.entity_id, entity_tag.tag_id
        );
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.create(&mut conn, entity_tag).await
    }

    pub async fn get(&self, entity_id: &str, tag_id: i64) -> StorageResult<Option<EntityTag>> {
        let key = EntityTagKey {
            entity_id: entity_id.to_string(),
            tag_id,
        };
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.get(&mut conn, &key).await
    }

    /// Remove one association, or every association of the entity when `tag_id` is `None`
    pub async fn delete(&self, entity_id: &str, tag_id: Option<i64>) -> StorageResult<u64> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        match tag_id {
            Some(tag_id) => {
                debug!("Removing tag {} from entity {}", tag_id, entity_id);
                let key = EntityTagKey {
                    entity_id: entity_id.to_string(),
                    tag_id,
                };
                self.repository.delete_by_id(&mut conn, &key).await
            }
            None => self.clear_entity_tags_on(&mut conn, entity_id).await,
        }
    }

    /// Remove every tag from an entity
    pub async fn clear_entity_tags(&self, entity_id: &str) -> StorageResult<u64> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.clear_entity_tags_on(&mut conn, entity_id).await
    }

    async fn clear_entity_tags_on(&self, conn: &mut SqliteConnection, entity_id: &str) -> StorageResult<u64> {
        debug!("Clearing tags of entity {}", entity_id);
        self.repository.delete_where(conn, "entity_id", entity_id).await
    }

    pub async fn advanced_search(
        &self,
        request: &AdvancedSearchRequest,
    ) -> StorageResult<AdvancedSearchResponse<EntityTag>> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.advanced_search(&mut conn, request).await
    }

    /// Replace every tag of an entity with the named groups and tags
    ///
    /// Runs in one transaction. Each group and each tag is applied in its own
    /// savepoint, so a failing item is recorded in `errors` and rolled back
    /// without affecting the rest of the reset.
    pub async fn reset_entity_tags_by_name(&self, request: &ResetEntityTags) -> StorageResult<ResetOutcome> {
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let cleared = self.clear_entity_tags_on(&mut tx, &request.entity_id).await?;
        debug!("Cleared {} tag(s) from entity {}", cleared, request.entity_id);

        let mut tags = Vec::new();
        let mut errors = Vec::new();

        for group in &request.tag_groups {
            let tag_group = match self.find_group_in_savepoint(&mut tx, &group.tag_group_name).await {
                Ok(tag_group) => tag_group,
                Err(e) => {
                    warn!("Error creating tag group {}: {}", group.tag_group_name, e);
                    errors.push(format!(
                        "Error creating tag group: {} - {}",
                        group.tag_group_name, e
                    ));
                    continue;
                }
            };

            for tag_name in &group.tag_names {
                match self.attach_in_savepoint(&mut tx, request, &tag_group, tag_name).await {
                    Ok(tag) => tags.push(tag),
                    Err(e) => {
                        warn!("Error creating tag {}: {}", tag_name, e);
                        errors.push(format!("Error creating tag: {} - {}", tag_name, e));
                    }
                }
            }
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;

        info!(
            "Reset tags of {} {}: {} attached, {} error(s)",
            request.entity_type,
            request.entity_id,
            tags.len(),
            errors.len()
        );

        Ok(ResetOutcome {
            entity_id: request.entity_id.clone(),
            entity_type: request.entity_type.clone(),
            tags,
            errors,
        })
    }

    async fn find_group_in_savepoint(&self, conn: &mut SqliteConnection, name: &str) -> StorageResult<TagGroup> {
        let mut savepoint = conn.begin().await.map_err(StorageError::Sqlx)?;
        let result = self.tag_groups.find_by_name_or_create_on(&mut savepoint, name).await;
        finish_savepoint(savepoint, result).await
    }

    async fn attach_in_savepoint(
        &self,
        conn: &mut SqliteConnection,
        request: &ResetEntityTags,
        tag_group: &TagGroup,
        tag_name: &str,
    ) -> StorageResult<Tag> {
        let mut savepoint = conn.begin().await.map_err(StorageError::Sqlx)?;
        let result = self.attach(&mut savepoint, request, tag_group, tag_name).await;
        finish_savepoint(savepoint, result).await
    }

    async fn attach(
        &self,
        conn: &mut SqliteConnection,
        request: &ResetEntityTags,
        tag_group: &TagGroup,
        tag_name: &str,
    ) -> StorageResult<Tag> {
        let tag = self
            .tags
            .find_by_name_or_create_on(&mut *conn, tag_name, tag_group)
            .await?;
        let entity_tag = EntityTag::new(request.entity_id.as_str(), request.entity_type.as_str(), tag.id);
        self.repository.create(&mut *conn, &entity_tag).await?;
        Ok(tag)
    }
}

async fn finish_savepoint<T>(
    savepoint: Transaction<'_, Sqlite>,
    result: StorageResult<T>,
) -> StorageResult<T> {
    match result {
        Ok(value) => {
            savepoint.commit().await.map_err(StorageError::Sqlx)?;
            Ok(value)
        }
        Err(e) => {
            savepoint.rollback().await.map_err(StorageError::Sqlx)?;
            Err(e)
        }
    }
}
