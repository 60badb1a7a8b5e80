// ABOUTME: Tag group, tag and entity tag record definitions
// ABOUTME: Table descriptions for the generic repository plus request payloads

use metatag_storage::{Columns, FieldSpec, FieldType, Record, RecordSpec, Value};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named category of tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TagGroup {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagGroupInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl TagGroupInput {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
        }
    }
}

static TAG_GROUP_SPEC: RecordSpec = RecordSpec {
    table: "tag_groups",
    fields: &[
        FieldSpec::new("id", FieldType::Number).unique(),
        FieldSpec::new("name", FieldType::String).unique(),
        FieldSpec::new("description", FieldType::String),
    ],
    key: &["id"],
};

impl Record for TagGroup {
    type Key = i64;

    fn spec() -> &'static RecordSpec {
        &TAG_GROUP_SPEC
    }

    fn key_values(key: &i64) -> Vec<Value> {
        vec![Value::Integer(*key)]
    }
}

impl Columns for TagGroupInput {
    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", self.name.clone().into()),
            ("description", self.description.clone().into()),
        ]
    }
}

/// A uniquely named label belonging to one tag group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub tag_group_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInput {
    pub name: String,
    pub tag_group_id: i64,
}

impl TagInput {
    pub fn new(name: impl Into<String>, tag_group_id: i64) -> Self {
        Self {
            name: name.into(),
            tag_group_id,
        }
    }
}

static TAG_SPEC: RecordSpec = RecordSpec {
    table: "tags",
    fields: &[
        FieldSpec::new("id", FieldType::Number).unique(),
        FieldSpec::new("name", FieldType::String).unique(),
        FieldSpec::new("tag_group_id", FieldType::Number),
    ],
    key: &["id"],
};

impl Record for Tag {
    type Key = i64;

    fn spec() -> &'static RecordSpec {
        &TAG_SPEC
    }

    fn key_values(key: &i64) -> Vec<Value> {
        vec![Value::Integer(*key)]
    }
}

impl Columns for TagInput {
    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", self.name.clone().into()),
            ("tag_group_id", self.tag_group_id.into()),
        ]
    }
}

/// Association between an external entity and a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EntityTag {
    pub entity_id: String,
    pub entity_type: String,
    pub tag_id: i64,
}

impl EntityTag {
    pub fn new(entity_id: impl Into<String>, entity_type: impl Into<String>, tag_id: i64) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_type: entity_type.into(),
            tag_id,
        }
    }
}

/// Composite key of an entity tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTagKey {
    pub entity_id: String,
    pub tag_id: i64,
}

static ENTITY_TAG_SPEC: RecordSpec = RecordSpec {
    table: "entity_tags",
    fields: &[
        FieldSpec::new("entity_id", FieldType::String),
        FieldSpec::new("entity_type", FieldType::String),
        FieldSpec::new("tag_id", FieldType::Number),
    ],
    key: &["entity_id", "tag_id"],
};

impl Record for EntityTag {
    type Key = EntityTagKey;

    fn spec() -> &'static RecordSpec {
        &ENTITY_TAG_SPEC
    }

    fn key_values(key: &EntityTagKey) -> Vec<Value> {
        vec![key.entity_id.clone().into(), key.tag_id.into()]
    }
}

impl Columns for EntityTag {
    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("entity_id", self.entity_id.clone().into()),
            ("entity_type", self.entity_type.clone().into()),
            ("tag_id", self.tag_id.into()),
        ]
    }
}

/// Tag names to attach from one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagGroupTags {
    pub tag_group_name: String,
    #[serde(default)]
    pub tag_names: Vec<String>,
}

/// Declarative replacement of every tag on an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetEntityTags {
    pub entity_id: String,
    pub entity_type: String,
    #[serde(default)]
    pub tag_groups: Vec<TagGroupTags>,
}

/// Tags attached by a reset, plus the items that could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetOutcome {
    pub entity_id: String,
    pub entity_type: String,
    pub tags: Vec<Tag>,
    pub errors: Vec<String>,
}
