use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{PortfolioError, PortfolioResult, Resource};
use super::{media as media_rules, ownership, subdomain};
use crate::db::PortfolioStore;
use crate::models::find_by_id;
use crate::models::media::{Media, UploadMedia};
use crate::models::portfolio::{CreatePortfolio, Portfolio, UpdatePortfolio};
use crate::models::projects::{CreateProject, Project, UpdateProject};
use crate::models::sections::{CreateSection, Section, UpdateSection};

/// Orchestrates every read and mutation of the portfolio aggregate.
///
/// Mutations run in a fixed order: input validation, existence, ownership,
/// subdomain uniqueness, then exactly one targeted store write. Nested
/// existence checks run against the snapshot loaded at the start; the write
/// re-matches by parent ID + child ID and a zero-record result is reported as
/// the child's `NotFound`, since the child may have been removed in between.
#[derive(Clone)]
pub struct PortfolioService {
    store: Arc<dyn PortfolioStore>,
    media_url_prefix: String,
}

fn require(field: &str, value: &str) -> PortfolioResult<()> {
    if value.is_empty() {
        Err(PortfolioError::Validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// Map a store write's affected-record count onto the domain result.
fn expect_affected(affected: u64, missing: Resource) -> PortfolioResult<()> {
    if affected == 0 {
        Err(PortfolioError::NotFound(missing))
    } else {
        Ok(())
    }
}

impl PortfolioService {
    pub fn new(store: Arc<dyn PortfolioStore>, media_url_prefix: impl Into<String>) -> Self {
        Self {
            store,
            media_url_prefix: media_url_prefix.into(),
        }
    }

    /// Existence first, then ownership.
    async fn load_owned(&self, id: Uuid, requester: Uuid) -> PortfolioResult<Portfolio> {
        let portfolio = self.get_by_id(id).await?;
        ownership::authorize(portfolio.user_id, requester)?;
        Ok(portfolio)
    }

    fn require_project(portfolio: &Portfolio, project_id: Uuid) -> PortfolioResult<&Project> {
        find_by_id(&portfolio.projects, project_id).ok_or(PortfolioError::NotFound(Resource::Project))
    }

    fn require_section(portfolio: &Portfolio, section_id: Uuid) -> PortfolioResult<&Section> {
        find_by_id(&portfolio.sections, section_id).ok_or(PortfolioError::NotFound(Resource::Section))
    }

    /// Re-read the aggregate after a write and pick out one project.
    async fn reload_project(&self, portfolio_id: Uuid, project_id: Uuid) -> PortfolioResult<Project> {
        let portfolio = self.get_by_id(portfolio_id).await?;
        find_by_id(&portfolio.projects, project_id)
            .cloned()
            .ok_or(PortfolioError::NotFound(Resource::Project))
    }

    async fn reload_section(&self, portfolio_id: Uuid, section_id: Uuid) -> PortfolioResult<Section> {
        let portfolio = self.get_by_id(portfolio_id).await?;
        find_by_id(&portfolio.sections, section_id)
            .cloned()
            .ok_or(PortfolioError::NotFound(Resource::Section))
    }

    // ── Portfolio ──

    pub async fn create(&self, owner: Uuid, input: CreatePortfolio) -> PortfolioResult<Portfolio> {
        require("title", &input.title)?;
        require("description", &input.description)?;
        require("theme", &input.theme)?;
        require("layout", &input.layout)?;
        subdomain::validate(&input.subdomain)?;

        if subdomain::is_taken(self.store.as_ref(), &input.subdomain, None).await? {
            return Err(PortfolioError::SubdomainTaken);
        }

        let now = Utc::now();
        let portfolio = Portfolio {
            id: Uuid::new_v4(),
            user_id: owner,
            title: input.title,
            description: input.description,
            theme: input.theme,
            layout: input.layout,
            portfolio_type: input.portfolio_type.unwrap_or_default(),
            subdomain: input.subdomain,
            custom_domain: None,
            is_published: false,
            projects: Vec::new(),
            sections: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        // A concurrent create can still win the race; the unique index turns
        // that into the same SubdomainTaken.
        let created = self.store.insert_portfolio(portfolio).await?;
        info!(portfolio_id = %created.id, %owner, subdomain = %created.subdomain, "portfolio created");
        Ok(created)
    }

    pub async fn get_by_id(&self, id: Uuid) -> PortfolioResult<Portfolio> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(PortfolioError::NotFound(Resource::Portfolio))
    }

    pub async fn get_by_subdomain(&self, subdomain: &str) -> PortfolioResult<Portfolio> {
        self.store
            .find_by_subdomain(subdomain)
            .await?
            .ok_or(PortfolioError::NotFound(Resource::Portfolio))
    }

    pub async fn get_by_owner(&self, owner: Uuid) -> PortfolioResult<Vec<Portfolio>> {
        Ok(self.store.find_by_owner(owner).await?)
    }

    /// Apply the present fields of `input`; absent fields are left untouched
    /// and `updatedAt` advances either way.
    pub async fn update(
        &self,
        id: Uuid,
        requester: Uuid,
        input: UpdatePortfolio,
    ) -> PortfolioResult<Portfolio> {
        if let Some(new_subdomain) = &input.subdomain {
            subdomain::validate(new_subdomain)?;
        }

        let current = self.load_owned(id, requester).await?;

        if let Some(new_subdomain) = &input.subdomain {
            if *new_subdomain != current.subdomain
                && subdomain::is_taken(self.store.as_ref(), new_subdomain, Some(id)).await?
            {
                return Err(PortfolioError::SubdomainTaken);
            }
        }

        let affected = self.store.update_portfolio(id, &input, Utc::now()).await?;
        expect_affected(affected, Resource::Portfolio)?;
        debug!(portfolio_id = %id, "portfolio updated");

        self.get_by_id(id).await
    }

    pub async fn delete(&self, id: Uuid, requester: Uuid) -> PortfolioResult<()> {
        self.load_owned(id, requester).await?;

        let affected = self.store.delete_portfolio(id).await?;
        expect_affected(affected, Resource::Portfolio)?;
        info!(portfolio_id = %id, "portfolio deleted");
        Ok(())
    }

    // ── Projects ──

    pub async fn add_project(
        &self,
        portfolio_id: Uuid,
        requester: Uuid,
        input: CreateProject,
    ) -> PortfolioResult<Project> {
        require("title", &input.title)?;
        require("description", &input.description)?;
        require("content", &input.content)?;

        self.load_owned(portfolio_id, requester).await?;

        let project = Project::new(input, Utc::now());
        let affected = self.store.append_project(portfolio_id, &project).await?;
        expect_affected(affected, Resource::Portfolio)?;
        debug!(%portfolio_id, project_id = %project.id, "project added");

        self.reload_project(portfolio_id, project.id).await
    }

    pub async fn update_project(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        requester: Uuid,
        input: UpdateProject,
    ) -> PortfolioResult<Project> {
        let snapshot = self.load_owned(portfolio_id, requester).await?;
        Self::require_project(&snapshot, project_id)?;

        let affected = self
            .store
            .update_project(portfolio_id, project_id, &input, Utc::now())
            .await?;
        expect_affected(affected, Resource::Project)?;
        debug!(%portfolio_id, %project_id, "project updated");

        self.reload_project(portfolio_id, project_id).await
    }

    pub async fn delete_project(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        requester: Uuid,
    ) -> PortfolioResult<()> {
        let snapshot = self.load_owned(portfolio_id, requester).await?;
        Self::require_project(&snapshot, project_id)?;

        let affected = self
            .store
            .remove_project(portfolio_id, project_id, Utc::now())
            .await?;
        expect_affected(affected, Resource::Project)?;
        debug!(%portfolio_id, %project_id, "project deleted");
        Ok(())
    }

    // ── Sections ──

    pub async fn add_section(
        &self,
        portfolio_id: Uuid,
        requester: Uuid,
        input: CreateSection,
    ) -> PortfolioResult<Section> {
        require("title", &input.title)?;
        require("type", &input.section_type)?;
        require("content", &input.content)?;

        self.load_owned(portfolio_id, requester).await?;

        let section = Section::new(input, Utc::now());
        let affected = self.store.append_section(portfolio_id, &section).await?;
        expect_affected(affected, Resource::Portfolio)?;
        debug!(%portfolio_id, section_id = %section.id, "section added");

        self.reload_section(portfolio_id, section.id).await
    }

    pub async fn update_section(
        &self,
        portfolio_id: Uuid,
        section_id: Uuid,
        requester: Uuid,
        input: UpdateSection,
    ) -> PortfolioResult<Section> {
        let snapshot = self.load_owned(portfolio_id, requester).await?;
        Self::require_section(&snapshot, section_id)?;

        let affected = self
            .store
            .update_section(portfolio_id, section_id, &input, Utc::now())
            .await?;
        expect_affected(affected, Resource::Section)?;
        debug!(%portfolio_id, %section_id, "section updated");

        self.reload_section(portfolio_id, section_id).await
    }

    pub async fn delete_section(
        &self,
        portfolio_id: Uuid,
        section_id: Uuid,
        requester: Uuid,
    ) -> PortfolioResult<()> {
        let snapshot = self.load_owned(portfolio_id, requester).await?;
        Self::require_section(&snapshot, section_id)?;

        let affected = self
            .store
            .remove_section(portfolio_id, section_id, Utc::now())
            .await?;
        expect_affected(affected, Resource::Section)?;
        debug!(%portfolio_id, %section_id, "section deleted");
        Ok(())
    }

    // ── Media ──

    /// Record an uploaded file on a project. Only the URL is persisted; the
    /// bytes are the caller's business.
    pub async fn add_media(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        requester: Uuid,
        input: UploadMedia,
        filename: &str,
    ) -> PortfolioResult<Media> {
        media_rules::validate_filename(filename)?;

        let snapshot = self.load_owned(portfolio_id, requester).await?;
        Self::require_project(&snapshot, project_id)?;

        let media_type = media_rules::check_media_type(&input.media_type, filename)?;

        let media = Media {
            id: Uuid::new_v4(),
            media_type,
            url: media_rules::media_url(&self.media_url_prefix, portfolio_id, project_id, filename),
            caption: input.caption,
            order: input.order,
            created_at: Utc::now(),
        };

        let affected = self
            .store
            .append_media(portfolio_id, project_id, &media)
            .await?;
        expect_affected(affected, Resource::Project)?;
        debug!(%portfolio_id, %project_id, media_id = %media.id, url = %media.url, "media added");

        let project = self.reload_project(portfolio_id, project_id).await?;
        find_by_id(&project.media, media.id)
            .cloned()
            .ok_or(PortfolioError::NotFound(Resource::Media))
    }

    pub async fn delete_media(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        media_id: Uuid,
        requester: Uuid,
    ) -> PortfolioResult<()> {
        let snapshot = self.load_owned(portfolio_id, requester).await?;
        let project = Self::require_project(&snapshot, project_id)?;
        find_by_id(&project.media, media_id).ok_or(PortfolioError::NotFound(Resource::Media))?;

        let affected = self
            .store
            .remove_media(portfolio_id, project_id, media_id, Utc::now())
            .await?;
        expect_affected(affected, Resource::Media)?;
        debug!(%portfolio_id, %project_id, %media_id, "media deleted");
        Ok(())
    }
}
