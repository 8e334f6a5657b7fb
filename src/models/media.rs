use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::HasId;

/// Media kind stored as a lowercase string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[sea_orm(string_value = "image")]
    Image,
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "document")]
    Document,
}

impl MediaType {
    /// Parse the declared type of an upload. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "document" => Some(Self::Document),
            _ => None,
        }
    }
}

/// SeaORM entity for the `media` table. `portfolio_id` is denormalised so a
/// removal can be matched against the owning portfolio without a join.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "media")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub project_id: Uuid,
    pub media_type: MediaType,
    pub url: String,
    pub caption: String,
    pub sort_order: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::projects::Entity",
        from = "Column::ProjectId",
        to = "super::projects::Column::Id"
    )]
    Project,
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── Aggregate element ──

/// A media entry of a project. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub url: String,
    pub caption: String,
    pub order: i32,
    pub created_at: DateTimeUtc,
}

impl HasId for Media {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl From<Model> for Media {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            media_type: m.media_type,
            url: m.url,
            caption: m.caption,
            order: m.sort_order,
            created_at: m.created_at,
        }
    }
}

// ── DTOs ──

/// Metadata accompanying an upload. `media_type` stays a raw string so an
/// unknown value surfaces as an invalid media type rather than a parse error.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadMedia {
    #[serde(rename = "type")]
    pub media_type: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub order: i32,
}
