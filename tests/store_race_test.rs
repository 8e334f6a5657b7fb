//! What the service reports when another request changes the aggregate
//! between its checks and its write.
//!
//! `RacingStore` wraps the in-memory store and replays the competing request
//! right before the write it intercepts, which is the window the snapshot
//! checks cannot close.
//!
//! Run with: `cargo test --test store_race_test`
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use musefolio_backend::db::store::Timestamp;
use musefolio_backend::db::{InMemoryPortfolioStore, PortfolioStore, StoreResult};
use musefolio_backend::models::media::{Media, UploadMedia};
use musefolio_backend::models::portfolio::{CreatePortfolio, Portfolio, UpdatePortfolio};
use musefolio_backend::models::projects::{CreateProject, Project, UpdateProject};
use musefolio_backend::models::sections::{CreateSection, Section, UpdateSection};
use musefolio_backend::services::{PortfolioError, PortfolioService, Resource};

/// The competing request that lands first.
#[derive(Clone, Copy)]
enum Interleave {
    /// The child about to be written is deleted.
    ChildRemoved,
    /// The subdomain about to be written is claimed by another owner.
    SubdomainClaimed,
}

struct RacingStore {
    inner: InMemoryPortfolioStore,
    interleave: Interleave,
}

impl RacingStore {
    fn removes_children(&self) -> bool {
        matches!(self.interleave, Interleave::ChildRemoved)
    }

    async fn claim(&self, subdomain: &str, like: Portfolio) -> StoreResult<()> {
        if matches!(self.interleave, Interleave::SubdomainClaimed) {
            let rival = Portfolio {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                subdomain: subdomain.to_string(),
                ..like
            };
            self.inner.insert_portfolio(rival).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PortfolioStore for RacingStore {
    async fn insert_portfolio(&self, portfolio: Portfolio) -> StoreResult<Portfolio> {
        self.claim(&portfolio.subdomain, portfolio.clone()).await?;
        self.inner.insert_portfolio(portfolio).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Portfolio>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Portfolio>> {
        self.inner.find_by_subdomain(subdomain).await
    }

    async fn find_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Portfolio>> {
        self.inner.find_by_owner(owner).await
    }

    async fn update_portfolio(
        &self,
        id: Uuid,
        patch: &UpdatePortfolio,
        at: Timestamp,
    ) -> StoreResult<u64> {
        if let (Some(subdomain), Some(current)) =
            (&patch.subdomain, self.inner.find_by_id(id).await?)
        {
            self.claim(subdomain, current).await?;
        }
        self.inner.update_portfolio(id, patch, at).await
    }

    async fn delete_portfolio(&self, id: Uuid) -> StoreResult<u64> {
        self.inner.delete_portfolio(id).await
    }

    async fn append_project(&self, portfolio_id: Uuid, project: &Project) -> StoreResult<u64> {
        self.inner.append_project(portfolio_id, project).await
    }

    async fn update_project(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        patch: &UpdateProject,
        at: Timestamp,
    ) -> StoreResult<u64> {
        if self.removes_children() {
            self.inner.remove_project(portfolio_id, project_id, at).await?;
        }
        self.inner
            .update_project(portfolio_id, project_id, patch, at)
            .await
    }

    async fn remove_project(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        at: Timestamp,
    ) -> StoreResult<u64> {
        if self.removes_children() {
            self.inner.remove_project(portfolio_id, project_id, at).await?;
        }
        self.inner.remove_project(portfolio_id, project_id, at).await
    }

    async fn append_section(&self, portfolio_id: Uuid, section: &Section) -> StoreResult<u64> {
        self.inner.append_section(portfolio_id, section).await
    }

    async fn update_section(
        &self,
        portfolio_id: Uuid,
        section_id: Uuid,
        patch: &UpdateSection,
        at: Timestamp,
    ) -> StoreResult<u64> {
        if self.removes_children() {
            self.inner.remove_section(portfolio_id, section_id, at).await?;
        }
        self.inner
            .update_section(portfolio_id, section_id, patch, at)
            .await
    }

    async fn remove_section(
        &self,
        portfolio_id: Uuid,
        section_id: Uuid,
        at: Timestamp,
    ) -> StoreResult<u64> {
        if self.removes_children() {
            self.inner.remove_section(portfolio_id, section_id, at).await?;
        }
        self.inner.remove_section(portfolio_id, section_id, at).await
    }

    async fn append_media(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        media: &Media,
    ) -> StoreResult<u64> {
        if self.removes_children() {
            self.inner
                .remove_project(portfolio_id, project_id, media.created_at)
                .await?;
        }
        self.inner.append_media(portfolio_id, project_id, media).await
    }

    async fn remove_media(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        media_id: Uuid,
        at: Timestamp,
    ) -> StoreResult<u64> {
        if self.removes_children() {
            self.inner
                .remove_media(portfolio_id, project_id, media_id, at)
                .await?;
        }
        self.inner
            .remove_media(portfolio_id, project_id, media_id, at)
            .await
    }
}

/// Plain service for seeding plus a racing service over the same data.
fn services(interleave: Interleave) -> (PortfolioService, PortfolioService) {
    let inner = InMemoryPortfolioStore::new();
    let plain = PortfolioService::new(Arc::new(inner.clone()), "/media");
    let racing = PortfolioService::new(Arc::new(RacingStore { inner, interleave }), "/media");
    (plain, racing)
}

fn new_portfolio(subdomain: &str) -> CreatePortfolio {
    CreatePortfolio {
        title: "Alice Builds".to_string(),
        description: "Structural engineering work".to_string(),
        theme: "light".to_string(),
        layout: "grid".to_string(),
        subdomain: subdomain.to_string(),
        portfolio_type: None,
    }
}

fn new_project() -> CreateProject {
    CreateProject {
        title: "Bridge Design".to_string(),
        description: "A pedestrian bridge".to_string(),
        content: "Long-form write-up".to_string(),
        tags: Vec::new(),
        order: 0,
    }
}

fn new_section() -> CreateSection {
    CreateSection {
        title: "About me".to_string(),
        section_type: "text".to_string(),
        content: "Hello".to_string(),
        order: 0,
    }
}

fn image() -> UploadMedia {
    UploadMedia {
        media_type: "image".to_string(),
        caption: String::new(),
        order: 0,
    }
}

async fn seeded(plain: &PortfolioService) -> (Uuid, Portfolio, Project) {
    let owner = Uuid::new_v4();
    let portfolio = plain.create(owner, new_portfolio("alice123")).await.unwrap();
    let project = plain
        .add_project(portfolio.id, owner, new_project())
        .await
        .unwrap();
    (owner, portfolio, project)
}

// ── Zero affected records after a passing snapshot check ──

#[tokio::test]
async fn project_removed_before_update_is_not_found() {
    let (plain, racing) = services(Interleave::ChildRemoved);
    let (owner, portfolio, project) = seeded(&plain).await;

    let patch = UpdateProject {
        order: Some(2),
        ..Default::default()
    };
    let err = racing
        .update_project(portfolio.id, project.id, owner, patch)
        .await
        .unwrap_err();

    assert!(matches!(err, PortfolioError::NotFound(Resource::Project)));
    assert!(plain.get_by_id(portfolio.id).await.unwrap().projects.is_empty());
}

#[tokio::test]
async fn project_removed_before_delete_is_not_found() {
    let (plain, racing) = services(Interleave::ChildRemoved);
    let (owner, portfolio, project) = seeded(&plain).await;

    let err = racing
        .delete_project(portfolio.id, project.id, owner)
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::NotFound(Resource::Project)));
}

#[tokio::test]
async fn project_removed_before_media_append_is_not_found() {
    let (plain, racing) = services(Interleave::ChildRemoved);
    let (owner, portfolio, project) = seeded(&plain).await;

    let err = racing
        .add_media(portfolio.id, project.id, owner, image(), "span.jpg")
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::NotFound(Resource::Project)));
}

#[tokio::test]
async fn section_removed_before_write_is_not_found() {
    let (plain, racing) = services(Interleave::ChildRemoved);
    let owner = Uuid::new_v4();
    let portfolio = plain.create(owner, new_portfolio("alice123")).await.unwrap();

    let section = plain
        .add_section(portfolio.id, owner, new_section())
        .await
        .unwrap();
    let err = racing
        .update_section(portfolio.id, section.id, owner, UpdateSection::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::NotFound(Resource::Section)));

    let section = plain
        .add_section(portfolio.id, owner, new_section())
        .await
        .unwrap();
    let err = racing
        .delete_section(portfolio.id, section.id, owner)
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::NotFound(Resource::Section)));
}

#[tokio::test]
async fn media_removed_before_delete_is_not_found() {
    let (plain, racing) = services(Interleave::ChildRemoved);
    let (owner, portfolio, project) = seeded(&plain).await;
    let media = plain
        .add_media(portfolio.id, project.id, owner, image(), "span.jpg")
        .await
        .unwrap();

    let err = racing
        .delete_media(portfolio.id, project.id, media.id, owner)
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::NotFound(Resource::Media)));
}

// ── Store conflict after a passing uniqueness pre-check ──

#[tokio::test]
async fn subdomain_claimed_before_insert_is_taken() {
    let (plain, racing) = services(Interleave::SubdomainClaimed);
    let owner = Uuid::new_v4();

    let err = racing
        .create(owner, new_portfolio("alice123"))
        .await
        .unwrap_err();

    assert!(matches!(err, PortfolioError::SubdomainTaken));
    assert!(plain.get_by_owner(owner).await.unwrap().is_empty());
    let winner = plain.get_by_subdomain("alice123").await.unwrap();
    assert_ne!(winner.user_id, owner);
}

#[tokio::test]
async fn subdomain_claimed_before_update_is_taken() {
    let (plain, racing) = services(Interleave::SubdomainClaimed);
    let owner = Uuid::new_v4();
    let before = plain.create(owner, new_portfolio("alice123")).await.unwrap();

    let patch = UpdatePortfolio {
        subdomain: Some("alice456".to_string()),
        title: Some("Renamed".to_string()),
        ..Default::default()
    };
    let err = racing.update(before.id, owner, patch).await.unwrap_err();

    assert!(matches!(err, PortfolioError::SubdomainTaken));
    assert_eq!(plain.get_by_id(before.id).await.unwrap(), before);
    assert_ne!(
        plain.get_by_subdomain("alice456").await.unwrap().id,
        before.id
    );
}

// ── Concurrent requests against the real store ──

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_bind_a_subdomain_once() {
    let service = PortfolioService::new(Arc::new(InMemoryPortfolioStore::new()), "/media");

    for round in 0..20 {
        let subdomain = format!("site{round}");
        let (a, b) = tokio::join!(
            service.create(Uuid::new_v4(), new_portfolio(&subdomain)),
            service.create(Uuid::new_v4(), new_portfolio(&subdomain)),
        );

        let outcomes = [a, b];
        let created = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(created, 1, "{subdomain}");
        assert!(
            outcomes
                .iter()
                .any(|r| matches!(r, Err(PortfolioError::SubdomainTaken)))
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_edits_to_different_children_both_land() {
    let service = PortfolioService::new(Arc::new(InMemoryPortfolioStore::new()), "/media");
    let owner = Uuid::new_v4();
    let portfolio = service.create(owner, new_portfolio("alice123")).await.unwrap();
    let first = service
        .add_project(portfolio.id, owner, new_project())
        .await
        .unwrap();
    let second = service
        .add_project(portfolio.id, owner, new_project())
        .await
        .unwrap();

    let rename = |title: &str| UpdateProject {
        title: Some(title.to_string()),
        ..Default::default()
    };
    let (a, b, c) = tokio::join!(
        service.update_project(portfolio.id, first.id, owner, rename("Span")),
        service.update_project(portfolio.id, second.id, owner, rename("Tower")),
        service.add_section(portfolio.id, owner, new_section()),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    let reloaded = service.get_by_id(portfolio.id).await.unwrap();
    assert_eq!(reloaded.projects[0].title, "Span");
    assert_eq!(reloaded.projects[1].title, "Tower");
    assert_eq!(reloaded.sections.len(), 1);
    assert!(reloaded.updated_at >= portfolio.updated_at);
}
