//! The document-store boundary the portfolio service is written against.
//!
//! Every mutating call is one targeted write that reports how many records it
//! actually touched. A `0` means the addressed portfolio (or the child matched
//! by parent ID + child ID) did not exist at write time; callers translate it
//! into the matching not-found error instead of trusting an earlier read.
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::models::media::Media;
use crate::models::portfolio::{Portfolio, UpdatePortfolio};
use crate::models::projects::{Project, UpdateProject};
use crate::models::sections::{Section, UpdateSection};

pub type Timestamp = chrono::DateTime<chrono::Utc>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A storage-level uniqueness constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait PortfolioStore: Send + Sync {
    /// Insert a new aggregate. Fails with `Conflict` if its subdomain is bound.
    async fn insert_portfolio(&self, portfolio: Portfolio) -> StoreResult<Portfolio>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Portfolio>>;
    async fn find_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Portfolio>>;
    async fn find_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Portfolio>>;

    /// Set the present top-level fields of `patch` and bump `updated_at`.
    async fn update_portfolio(
        &self,
        id: Uuid,
        patch: &UpdatePortfolio,
        at: Timestamp,
    ) -> StoreResult<u64>;
    /// Delete the aggregate together with every nested element.
    async fn delete_portfolio(&self, id: Uuid) -> StoreResult<u64>;

    async fn append_project(&self, portfolio_id: Uuid, project: &Project) -> StoreResult<u64>;
    async fn update_project(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        patch: &UpdateProject,
        at: Timestamp,
    ) -> StoreResult<u64>;
    /// Remove a project; its media goes with it.
    async fn remove_project(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        at: Timestamp,
    ) -> StoreResult<u64>;

    async fn append_section(&self, portfolio_id: Uuid, section: &Section) -> StoreResult<u64>;
    async fn update_section(
        &self,
        portfolio_id: Uuid,
        section_id: Uuid,
        patch: &UpdateSection,
        at: Timestamp,
    ) -> StoreResult<u64>;
    async fn remove_section(
        &self,
        portfolio_id: Uuid,
        section_id: Uuid,
        at: Timestamp,
    ) -> StoreResult<u64>;

    async fn append_media(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        media: &Media,
    ) -> StoreResult<u64>;
    async fn remove_media(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        media_id: Uuid,
        at: Timestamp,
    ) -> StoreResult<u64>;
}
