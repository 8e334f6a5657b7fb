use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::HasId;

/// SeaORM entity for the `sections` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sections")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub title: String,
    pub section_type: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
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
}

impl Related<super::portfolio::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Portfolio.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── Aggregate element ──

/// A free-form portfolio section. `type` is only a rendering hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "type")]
    pub section_type: String,
    pub content: String,
    pub order: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl HasId for Section {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl From<Model> for Section {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            section_type: m.section_type,
            content: m.content,
            order: m.sort_order,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl Section {
    pub fn new(input: CreateSection, at: DateTimeUtc) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            section_type: input.section_type,
            content: input.content,
            order: input.order,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn apply(&mut self, patch: &UpdateSection, at: DateTimeUtc) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(section_type) = &patch.section_type {
            self.section_type = section_type.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(order) = patch.order {
            self.order = order;
        }
        self.updated_at = at;
    }
}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSection {
    pub title: String,
    #[serde(rename = "type")]
    pub section_type: String,
    pub content: String,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSection {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub section_type: Option<String>,
    pub content: Option<String>,
    pub order: Option<i32>,
}
