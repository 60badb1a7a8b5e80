// ABOUTME: Shared application state for API handlers
// ABOUTME: Holds the pool, resolved settings and the tagging services

use std::sync::Arc;

use metatag_config::Settings;
use metatag_tags::{EntityTagService, TagGroupService, TagService};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub settings: Arc<Settings>,
    pub tag_group_service: Arc<TagGroupService>,
    pub tag_service: Arc<TagService>,
    pub entity_tag_service: Arc<EntityTagService>,
}

impl AppState {
    /// Create application state from a migrated SQLite pool
    pub fn new(pool: SqlitePool, settings: Settings) -> Self {
        let tag_group_service = Arc::new(TagGroupService::new(pool.clone()));
        let tag_service = Arc::new(TagService::new(pool.clone()));
        let entity_tag_service = Arc::new(EntityTagService::new(
            pool.clone(),
            tag_group_service.clone(),
            tag_service.clone(),
        ));

        Self {
            pool,
            settings: Arc::new(settings),
            tag_group_service,
            tag_service,
            entity_tag_service,
        }
    }
}
