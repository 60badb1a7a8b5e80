// ABOUTME: Tag service on top of the generic repository
// ABOUTME: Group-aware find-or-create and cleanup of tags no entity uses

use metatag_storage::{
    AdvancedSearchRequest, AdvancedSearchResponse, Repository, StorageError, StorageResult, Value,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::types::{Tag, TagGroup, TagInput};

pub struct TagService {
    pool: SqlitePool,
    repository: Repository<Tag>,
}

impl TagService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            repository: Repository::new(),
        }
    }

    pub async fn create(&self, input: &TagInput) -> StorageResult<Tag> {
        debug!("Creating tag: {} (group: {})", input.name, input.tag_group_id);
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.create(&mut conn, input).await
    }

    pub async fn get(&self, id: i64) -> StorageResult<Option<Tag>> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.get(&mut conn, &id).await
    }

    pub async fn update(&self, id: i64, input: &TagInput) -> StorageResult<Option<Tag>> {
        debug!("Updating tag: {}", id);
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.update(&mut conn, &id, input).await
    }

    pub async fn delete(&self, id: i64) -> StorageResult<u64> {
        debug!("Deleting tag: {}", id);
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.delete_by_id(&mut conn, &id).await
    }

    pub async fn advanced_search(
        &self,
        request: &AdvancedSearchRequest,
    ) -> StorageResult<AdvancedSearchResponse<Tag>> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.advanced_search(&mut conn, request).await
    }

    pub async fn find_by_unique_field(
        &self,
        field: &str,
        value: impl Into<Value>,
    ) -> StorageResult<Option<Tag>> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.find_by_unique_field(&mut conn, field, value).await
    }

    /// Return the tag called `name` in `tag_group`, creating it when absent
    ///
    /// Tag names are unique across groups, so a name already used by another
    /// group is a conflict.
    pub async fn find_by_name_or_create(&self, name: &str, tag_group: &TagGroup) -> StorageResult<Tag> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.find_by_name_or_create_on(&mut conn, name, tag_group).await
    }

    pub(crate) async fn find_by_name_or_create_on(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
        tag_group: &TagGroup,
    ) -> StorageResult<Tag> {
        let input = TagInput::new(name, tag_group.id);
        let (tag, created) = self.repository.create_or_get(conn, &input, "name").await?;

        if tag.tag_group_id != tag_group.id {
            return Err(StorageError::Conflict(format!(
                "Tag {} already exists in another group",
                name
            )));
        }
        if created {
            debug!("Created tag {} ({}) in group {}", tag.name, tag.id, tag_group.name);
        }
        Ok(tag)
    }

    /// Delete every tag that no entity references, returning how many were removed
    pub async fn delete_tags_with_no_entities(&self) -> StorageResult<u64> {
        let deleted: Vec<i64> = sqlx::query_scalar(
            r#"
            DELETE FROM tags
            WHERE id IN (
                SELECT t.id FROM tags t
                LEFT JOIN entity_tags et ON et.tag_id = t.id
                WHERE et.entity_id IS NULL
            )
            RETURNING id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::classify)?;

        debug!("Deleted {} tag(s) with no entities: {:?}", deleted.len(), deleted);
        Ok(deleted.len() as u64)
    }
}
