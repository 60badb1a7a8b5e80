// ABOUTME: Tagging domain for Metatag
// ABOUTME: Record types and services for tag groups, tags and entity tags

pub mod entity_tags;
pub mod tag_groups;
pub mod tags;
pub mod types;

// Re-export main types
pub use entity_tags::EntityTagService;
pub use tag_groups::TagGroupService;
pub use tags::TagService;
pub use types::{
    EntityTag, EntityTagKey, ResetEntityTags, ResetOutcome, Tag, TagGroup, TagGroupInput,
    TagGroupTags, TagInput,
};
