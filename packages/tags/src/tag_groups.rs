// ABOUTME: Tag group service on top of the generic repository
// ABOUTME: CRUD, advanced search and conflict-free find-or-create by name

use metatag_storage::{
    AdvancedSearchRequest, AdvancedSearchResponse, Repository, StorageError, StorageResult, Value,
};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::types::{TagGroup, TagGroupInput};

pub struct TagGroupService {
    pool: SqlitePool,
    repository: Repository<TagGroup>,
}

impl TagGroupService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            repository: Repository::new(),
        }
    }

    pub async fn create(&self, input: &TagGroupInput) -> StorageResult<TagGroup> {
        debug!("Creating tag group: {}", input.name);
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.create(&mut conn, input).await
    }

    pub async fn get(&self, id: i64) -> StorageResult<Option<TagGroup>> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.get(&mut conn, &id).await
    }

    /// Replace name and description of an existing group
    pub async fn update(&self, id: i64, input: &TagGroupInput) -> StorageResult<Option<TagGroup>> {
        debug!("Updating tag group: {}", id);
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.update(&mut conn, &id, input).await
    }

    /// Delete a group; fails with a reference violation while tags still use it
    pub async fn delete(&self, id: i64) -> StorageResult<u64> {
        debug!("Deleting tag group: {}", id);
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.delete_by_id(&mut conn, &id).await
    }

    pub async fn advanced_search(
        &self,
        request: &AdvancedSearchRequest,
    ) -> StorageResult<AdvancedSearchResponse<TagGroup>> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.advanced_search(&mut conn, request).await
    }

    pub async fn find_by_unique_field(
        &self,
        field: &str,
        value: impl Into<Value>,
    ) -> StorageResult<Option<TagGroup>> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.repository.find_by_unique_field(&mut conn, field, value).await
    }

    /// Return the group called `name`, creating it when absent
    pub async fn find_by_name_or_create(&self, name: &str) -> StorageResult<TagGroup> {
        let mut conn = self.pool.acquire().await.map_err(StorageError::Sqlx)?;
        self.find_by_name_or_create_on(&mut conn, name).await
    }

    pub(crate) async fn find_by_name_or_create_on(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
    ) -> StorageResult<TagGroup> {
        let input = TagGroupInput::new(name, Some(format!("{} description", name)));
        let (group, created) = self.repository.create_or_get(conn, &input, "name").await?;
        if created {
            debug!("Created tag group {} ({})", group.name, group.id);
        }
        Ok(group)
    }
}
