use sea_orm::entity::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};

use super::projects::Project;
use super::sections::Section;

/// Portfolio kind stored as a lowercase string in the database.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum PortfolioType {
    #[sea_orm(string_value = "about")]
    About,
    #[sea_orm(string_value = "cv")]
    Cv,
    #[default]
    #[sea_orm(string_value = "portfolio")]
    Portfolio,
}

/// SeaORM entity for the `portfolios` table (the aggregate root row).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "portfolios")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub theme: String,
    pub layout: String,
    pub portfolio_type: PortfolioType,
    #[sea_orm(unique)]
    pub subdomain: String,
    pub custom_domain: Option<String>,
    pub is_published: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Owner,
    #[sea_orm(has_many = "super::projects::Entity")]
    Projects,
    #[sea_orm(has_many = "super::sections::Entity")]
    Sections,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<super::sections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sections.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── Aggregate ──

/// The portfolio aggregate: root fields plus its ordered projects and sections.
///
/// This is the shape every store returns and every read endpoint serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub theme: String,
    pub layout: String,
    #[serde(rename = "type")]
    pub portfolio_type: PortfolioType,
    pub subdomain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
    pub is_published: bool,
    pub projects: Vec<Project>,
    pub sections: Vec<Section>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Portfolio {
    pub fn from_parts(root: Model, projects: Vec<Project>, sections: Vec<Section>) -> Self {
        Self {
            id: root.id,
            user_id: root.user_id,
            title: root.title,
            description: root.description,
            theme: root.theme,
            layout: root.layout,
            portfolio_type: root.portfolio_type,
            subdomain: root.subdomain,
            custom_domain: root.custom_domain,
            is_published: root.is_published,
            projects,
            sections,
            created_at: root.created_at,
            updated_at: root.updated_at,
        }
    }

    /// Apply a partial update in place. Only fields present in `patch` change.
    pub fn apply(&mut self, patch: &UpdatePortfolio, at: DateTimeUtc) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(theme) = &patch.theme {
            self.theme = theme.clone();
        }
        if let Some(layout) = &patch.layout {
            self.layout = layout.clone();
        }
        if let Some(portfolio_type) = patch.portfolio_type {
            self.portfolio_type = portfolio_type;
        }
        if let Some(subdomain) = &patch.subdomain {
            self.subdomain = subdomain.clone();
        }
        if let Some(custom_domain) = &patch.custom_domain {
            self.custom_domain = custom_domain.clone();
        }
        if let Some(is_published) = patch.is_published {
            self.is_published = is_published;
        }
        self.updated_at = at;
    }
}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePortfolio {
    pub title: String,
    pub description: String,
    pub theme: String,
    pub layout: String,
    pub subdomain: String,
    #[serde(rename = "type", default)]
    pub portfolio_type: Option<PortfolioType>,
}

/// Partial update: a field left out of the request body stays `None` and is
/// not touched; a present field (even `""`) replaces the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePortfolio {
    pub title: Option<String>,
    pub description: Option<String>,
    pub theme: Option<String>,
    pub layout: Option<String>,
    pub subdomain: Option<String>,
    /// `Some(None)` (an explicit `null`) clears the custom domain.
    #[serde(default, deserialize_with = "present")]
    pub custom_domain: Option<Option<String>>,
    pub is_published: Option<bool>,
    #[serde(rename = "type")]
    pub portfolio_type: Option<PortfolioType>,
}

/// Tell an explicit `null` apart from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
