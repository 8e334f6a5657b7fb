use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::HasId;
use super::media::Media;

/// SeaORM entity for the `projects` table. One row per project element of a
/// portfolio's `projects` sequence.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: JsonValue,
    pub sort_order: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::portfolio::Entity",
        from = "Column::PortfolioId",
        to = "super::portfolio::Column::Id"
    )]
    Portfolio,
    #[sea_orm(has_many = "super::media::Entity")]
    Media,
}

impl Related<super::portfolio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Portfolio.def()
    }
}

impl Related<super::media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Media.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── Aggregate element ──

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub tags: Vec<String>,
    pub order: i32,
    pub media: Vec<Media>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl HasId for Project {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Project {
    pub fn new(input: CreateProject, at: DateTimeUtc) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            content: input.content,
            tags: input.tags,
            order: input.order,
            media: Vec::new(),
            created_at: at,
            updated_at: at,
        }
    }

    /// Rebuild the element from its row. A `tags` column that is not a string
    /// array yields `None` so the store can report a corrupt row.
    pub fn from_model(m: Model, media: Vec<Media>) -> Option<Self> {
        let tags = serde_json::from_value(m.tags).ok()?;
        Some(Self {
            id: m.id,
            title: m.title,
            description: m.description,
            content: m.content,
            tags,
            order: m.sort_order,
            media,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }

    pub fn apply(&mut self, patch: &UpdateProject, at: DateTimeUtc) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
        if let Some(order) = patch.order {
            self.order = order;
        }
        self.updated_at = at;
    }
}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub order: Option<i32>,
}
