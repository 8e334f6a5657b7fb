use async_trait::async_trait;
use sea_orm::prelude::Expr;
use sea_orm::*;
use std::collections::HashMap;
use uuid::Uuid;

use super::store::{PortfolioStore, StoreError, StoreResult, Timestamp};
use crate::models::media::{self, Media};
use crate::models::portfolio::{self, Portfolio, UpdatePortfolio};
use crate::models::projects::{self, Project, UpdateProject};
use crate::models::sections::{self, Section, UpdateSection};

/// Postgres-backed portfolio store.
///
/// Each aggregate is spread over `portfolios`, `projects`, `sections` and
/// `media`. Nested writes address a single child row by (portfolio ID, child
/// ID) and bump the root's `updated_at` inside the same transaction, so
/// concurrent writes to different children never overwrite each other.
#[derive(Clone)]
pub struct PgPortfolioStore {
    db: DatabaseConnection,
}

impl PgPortfolioStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Surface unique-index violations (the subdomain index) as `Conflict`.
fn classify(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::Conflict(detail),
        _ => StoreError::Database(err),
    }
}

/// Set the root's `updated_at` to `at` unless a later writer already moved
/// it further; it never goes backwards.
fn advance_updated_at(
    update: UpdateMany<portfolio::Entity>,
    at: Timestamp,
) -> UpdateMany<portfolio::Entity> {
    update.col_expr(
        portfolio::Column::UpdatedAt,
        Expr::cust_with_values("GREATEST(updated_at, ?)", [at]),
    )
}

/// Bump the root's `updated_at`. Returns 0 if the portfolio is gone.
async fn touch<C: ConnectionTrait>(db: &C, portfolio_id: Uuid, at: Timestamp) -> StoreResult<u64> {
    let result = advance_updated_at(portfolio::Entity::update_many(), at)
        .filter(portfolio::Column::Id.eq(portfolio_id))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Load the children of the given root rows and assemble full aggregates,
/// keeping the root order and the insertion order of every child sequence.
async fn assemble<C: ConnectionTrait>(
    db: &C,
    roots: Vec<portfolio::Model>,
) -> StoreResult<Vec<Portfolio>> {
    if roots.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = roots.iter().map(|r| r.id).collect();

    let project_rows = projects::Entity::find()
        .filter(projects::Column::PortfolioId.is_in(ids.clone()))
        .order_by_asc(projects::Column::CreatedAt)
        .order_by_asc(projects::Column::Id)
        .all(db)
        .await?;

    let section_rows = sections::Entity::find()
        .filter(sections::Column::PortfolioId.is_in(ids))
        .order_by_asc(sections::Column::CreatedAt)
        .order_by_asc(sections::Column::Id)
        .all(db)
        .await?;

    let project_ids: Vec<Uuid> = project_rows.iter().map(|p| p.id).collect();
    let media_rows = if project_ids.is_empty() {
        Vec::new()
    } else {
        media::Entity::find()
            .filter(media::Column::ProjectId.is_in(project_ids))
            .order_by_asc(media::Column::CreatedAt)
            .order_by_asc(media::Column::Id)
            .all(db)
            .await?
    };

    let mut media_by_project: HashMap<Uuid, Vec<Media>> = HashMap::new();
    for row in media_rows {
        media_by_project
            .entry(row.project_id)
            .or_default()
            .push(Media::from(row));
    }

    let mut projects_by_portfolio: HashMap<Uuid, Vec<Project>> = HashMap::new();
    for row in project_rows {
        let portfolio_id = row.portfolio_id;
        let project_id = row.id;
        let media = media_by_project.remove(&project_id).unwrap_or_default();
        let project = Project::from_model(row, media).ok_or_else(|| {
            StoreError::Corrupt(format!("project {project_id} has malformed tags"))
        })?;
        projects_by_portfolio
            .entry(portfolio_id)
            .or_default()
            .push(project);
    }

    let mut sections_by_portfolio: HashMap<Uuid, Vec<Section>> = HashMap::new();
    for row in section_rows {
        sections_by_portfolio
            .entry(row.portfolio_id)
            .or_default()
            .push(Section::from(row));
    }

    Ok(roots
        .into_iter()
        .map(|root| {
            let projects = projects_by_portfolio.remove(&root.id).unwrap_or_default();
            let sections = sections_by_portfolio.remove(&root.id).unwrap_or_default();
            Portfolio::from_parts(root, projects, sections)
        })
        .collect())
}

/// `UPDATE portfolios` touching only the fields present in `patch`.
fn portfolio_patch(
    id: Uuid,
    patch: &UpdatePortfolio,
    at: Timestamp,
) -> UpdateMany<portfolio::Entity> {
    let mut update = advance_updated_at(portfolio::Entity::update_many(), at);

    if let Some(title) = &patch.title {
        update = update.col_expr(portfolio::Column::Title, Expr::value(title.clone()));
    }
    if let Some(description) = &patch.description {
        update = update.col_expr(
            portfolio::Column::Description,
            Expr::value(description.clone()),
        );
    }
    if let Some(theme) = &patch.theme {
        update = update.col_expr(portfolio::Column::Theme, Expr::value(theme.clone()));
    }
    if let Some(layout) = &patch.layout {
        update = update.col_expr(portfolio::Column::Layout, Expr::value(layout.clone()));
    }
    if let Some(portfolio_type) = patch.portfolio_type {
        update = update.col_expr(
            portfolio::Column::PortfolioType,
            Expr::value(ActiveEnum::to_value(&portfolio_type)),
        );
    }
    if let Some(subdomain) = &patch.subdomain {
        update = update.col_expr(
            portfolio::Column::Subdomain,
            Expr::value(subdomain.clone()),
        );
    }
    if let Some(custom_domain) = &patch.custom_domain {
        update = update.col_expr(
            portfolio::Column::CustomDomain,
            Expr::value(custom_domain.clone()),
        );
    }
    if let Some(is_published) = patch.is_published {
        update = update.col_expr(portfolio::Column::IsPublished, Expr::value(is_published));
    }

    update.filter(portfolio::Column::Id.eq(id))
}

async fn find_one<C: ConnectionTrait>(
    db: &C,
    root: Option<portfolio::Model>,
) -> StoreResult<Option<Portfolio>> {
    match root {
        Some(root) => Ok(assemble(db, vec![root]).await?.pop()),
        None => Ok(None),
    }
}

#[async_trait]
impl PortfolioStore for PgPortfolioStore {
    async fn insert_portfolio(&self, input: Portfolio) -> StoreResult<Portfolio> {
        let new_portfolio = portfolio::ActiveModel {
            id: Set(input.id),
            user_id: Set(input.user_id),
            title: Set(input.title.clone()),
            description: Set(input.description.clone()),
            theme: Set(input.theme.clone()),
            layout: Set(input.layout.clone()),
            portfolio_type: Set(input.portfolio_type),
            subdomain: Set(input.subdomain.clone()),
            custom_domain: Set(input.custom_domain.clone()),
            is_published: Set(input.is_published),
            created_at: Set(input.created_at),
            updated_at: Set(input.updated_at),
        };

        let root = new_portfolio.insert(&self.db).await.map_err(classify)?;

        // A freshly created aggregate has no children.
        Ok(Portfolio::from_parts(root, Vec::new(), Vec::new()))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Portfolio>> {
        let root = portfolio::Entity::find_by_id(id).one(&self.db).await?;
        find_one(&self.db, root).await
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Portfolio>> {
        let root = portfolio::Entity::find()
            .filter(portfolio::Column::Subdomain.eq(subdomain))
            .one(&self.db)
            .await?;
        find_one(&self.db, root).await
    }

    async fn find_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Portfolio>> {
        let roots = portfolio::Entity::find()
            .filter(portfolio::Column::UserId.eq(owner))
            .order_by_asc(portfolio::Column::CreatedAt)
            .all(&self.db)
            .await?;
        assemble(&self.db, roots).await
    }

    async fn update_portfolio(
        &self,
        id: Uuid,
        patch: &UpdatePortfolio,
        at: Timestamp,
    ) -> StoreResult<u64> {
        let result = portfolio_patch(id, patch, at)
            .exec(&self.db)
            .await
            .map_err(classify)?;

        Ok(result.rows_affected)
    }

    async fn delete_portfolio(&self, id: Uuid) -> StoreResult<u64> {
        let result = portfolio::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    async fn append_project(&self, portfolio_id: Uuid, project: &Project) -> StoreResult<u64> {
        let txn = self.db.begin().await?;

        // Touching the root first locks it against a concurrent delete.
        if touch(&txn, portfolio_id, project.created_at).await? == 0 {
            return Ok(0);
        }

        let row = projects::ActiveModel {
            id: Set(project.id),
            portfolio_id: Set(portfolio_id),
            title: Set(project.title.clone()),
            description: Set(project.description.clone()),
            content: Set(project.content.clone()),
            tags: Set(serde_json::json!(project.tags)),
            sort_order: Set(project.order),
            created_at: Set(project.created_at),
            updated_at: Set(project.updated_at),
        };
        row.insert(&txn).await?;

        txn.commit().await?;
        Ok(1)
    }

    async fn update_project(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        patch: &UpdateProject,
        at: Timestamp,
    ) -> StoreResult<u64> {
        let mut update = projects::Entity::update_many()
            .col_expr(projects::Column::UpdatedAt, Expr::value(at));

        if let Some(title) = &patch.title {
            update = update.col_expr(projects::Column::Title, Expr::value(title.clone()));
        }
        if let Some(description) = &patch.description {
            update = update.col_expr(
                projects::Column::Description,
                Expr::value(description.clone()),
            );
        }
        if let Some(content) = &patch.content {
            update = update.col_expr(projects::Column::Content, Expr::value(content.clone()));
        }
        if let Some(tags) = &patch.tags {
            update = update.col_expr(projects::Column::Tags, Expr::value(serde_json::json!(tags)));
        }
        if let Some(order) = patch.order {
            update = update.col_expr(projects::Column::SortOrder, Expr::value(order));
        }

        let txn = self.db.begin().await?;

        let result = update
            .filter(projects::Column::PortfolioId.eq(portfolio_id))
            .filter(projects::Column::Id.eq(project_id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Ok(0);
        }

        touch(&txn, portfolio_id, at).await?;
        txn.commit().await?;
        Ok(result.rows_affected)
    }

    async fn remove_project(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        at: Timestamp,
    ) -> StoreResult<u64> {
        let txn = self.db.begin().await?;

        // Media rows go with the project through ON DELETE CASCADE.
        let result = projects::Entity::delete_many()
            .filter(projects::Column::PortfolioId.eq(portfolio_id))
            .filter(projects::Column::Id.eq(project_id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Ok(0);
        }

        touch(&txn, portfolio_id, at).await?;
        txn.commit().await?;
        Ok(result.rows_affected)
    }

    async fn append_section(&self, portfolio_id: Uuid, section: &Section) -> StoreResult<u64> {
        let txn = self.db.begin().await?;

        if touch(&txn, portfolio_id, section.created_at).await? == 0 {
            return Ok(0);
        }

        let row = sections::ActiveModel {
            id: Set(section.id),
            portfolio_id: Set(portfolio_id),
            title: Set(section.title.clone()),
            section_type: Set(section.section_type.clone()),
            content: Set(section.content.clone()),
            sort_order: Set(section.order),
            created_at: Set(section.created_at),
            updated_at: Set(section.updated_at),
        };
        row.insert(&txn).await?;

        txn.commit().await?;
        Ok(1)
    }

    async fn update_section(
        &self,
        portfolio_id: Uuid,
        section_id: Uuid,
        patch: &UpdateSection,
        at: Timestamp,
    ) -> StoreResult<u64> {
        let mut update = sections::Entity::update_many()
            .col_expr(sections::Column::UpdatedAt, Expr::value(at));

        if let Some(title) = &patch.title {
            update = update.col_expr(sections::Column::Title, Expr::value(title.clone()));
        }
        if let Some(section_type) = &patch.section_type {
            update = update.col_expr(
                sections::Column::SectionType,
                Expr::value(section_type.clone()),
            );
        }
        if let Some(content) = &patch.content {
            update = update.col_expr(sections::Column::Content, Expr::value(content.clone()));
        }
        if let Some(order) = patch.order {
            update = update.col_expr(sections::Column::SortOrder, Expr::value(order));
        }

        let txn = self.db.begin().await?;

        let result = update
            .filter(sections::Column::PortfolioId.eq(portfolio_id))
            .filter(sections::Column::Id.eq(section_id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Ok(0);
        }

        touch(&txn, portfolio_id, at).await?;
        txn.commit().await?;
        Ok(result.rows_affected)
    }

    async fn remove_section(
        &self,
        portfolio_id: Uuid,
        section_id: Uuid,
        at: Timestamp,
    ) -> StoreResult<u64> {
        let txn = self.db.begin().await?;

        let result = sections::Entity::delete_many()
            .filter(sections::Column::PortfolioId.eq(portfolio_id))
            .filter(sections::Column::Id.eq(section_id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Ok(0);
        }

        touch(&txn, portfolio_id, at).await?;
        txn.commit().await?;
        Ok(result.rows_affected)
    }

    async fn append_media(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        item: &Media,
    ) -> StoreResult<u64> {
        let txn = self.db.begin().await?;

        // Lock the parent project row so a concurrent project delete cannot
        // slip in between the check and the insert.
        let parent = projects::Entity::find()
            .filter(projects::Column::PortfolioId.eq(portfolio_id))
            .filter(projects::Column::Id.eq(project_id))
            .lock_exclusive()
            .one(&txn)
            .await?;
        if parent.is_none() {
            return Ok(0);
        }

        let row = media::ActiveModel {
            id: Set(item.id),
            portfolio_id: Set(portfolio_id),
            project_id: Set(project_id),
            media_type: Set(item.media_type),
            url: Set(item.url.clone()),
            caption: Set(item.caption.clone()),
            sort_order: Set(item.order),
            created_at: Set(item.created_at),
        };
        row.insert(&txn).await?;

        touch(&txn, portfolio_id, item.created_at).await?;
        txn.commit().await?;
        Ok(1)
    }

    async fn remove_media(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        media_id: Uuid,
        at: Timestamp,
    ) -> StoreResult<u64> {
        let txn = self.db.begin().await?;

        let result = media::Entity::delete_many()
            .filter(media::Column::PortfolioId.eq(portfolio_id))
            .filter(media::Column::ProjectId.eq(project_id))
            .filter(media::Column::Id.eq(media_id))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Ok(0);
        }

        touch(&txn, portfolio_id, at).await?;
        txn.commit().await?;
        Ok(result.rows_affected)
    }
}
