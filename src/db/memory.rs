//! In-memory implementation of the portfolio store.
//!
//! Aggregates live in a `HashMap` guarded by a `tokio::sync::RwLock`: reads
//! run concurrently, writes are serialised. It enforces the same unique
//! subdomain constraint and reports affected records the same way as the
//! Postgres store, which makes it a drop-in for tests and local development.
//! Nothing survives a restart.
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{PortfolioStore, StoreError, StoreResult, Timestamp};
use crate::models::media::Media;
use crate::models::portfolio::{Portfolio, UpdatePortfolio};
use crate::models::projects::{Project, UpdateProject};
use crate::models::sections::{Section, UpdateSection};
use crate::models::{find_by_id_mut, remove_by_id};

#[derive(Clone, Default)]
pub struct InMemoryPortfolioStore {
    portfolios: Arc<RwLock<HashMap<Uuid, Portfolio>>>,
}

impl InMemoryPortfolioStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn subdomain_bound(
    portfolios: &HashMap<Uuid, Portfolio>,
    subdomain: &str,
    excluding: Option<Uuid>,
) -> bool {
    portfolios
        .values()
        .any(|p| p.subdomain == subdomain && Some(p.id) != excluding)
}

fn touch(portfolio: &mut Portfolio, at: Timestamp) {
    portfolio.updated_at = portfolio.updated_at.max(at);
}

#[async_trait]
impl PortfolioStore for InMemoryPortfolioStore {
    async fn insert_portfolio(&self, portfolio: Portfolio) -> StoreResult<Portfolio> {
        let mut portfolios = self.portfolios.write().await;

        if subdomain_bound(&portfolios, &portfolio.subdomain, None) {
            return Err(StoreError::Conflict(format!(
                "subdomain {} already bound",
                portfolio.subdomain
            )));
        }
        if portfolios.contains_key(&portfolio.id) {
            return Err(StoreError::Conflict(format!(
                "portfolio {} already exists",
                portfolio.id
            )));
        }

        portfolios.insert(portfolio.id, portfolio.clone());
        Ok(portfolio)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Portfolio>> {
        Ok(self.portfolios.read().await.get(&id).cloned())
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Portfolio>> {
        let portfolios = self.portfolios.read().await;
        Ok(portfolios
            .values()
            .find(|p| p.subdomain == subdomain)
            .cloned())
    }

    async fn find_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Portfolio>> {
        let portfolios = self.portfolios.read().await;
        let mut owned: Vec<Portfolio> = portfolios
            .values()
            .filter(|p| p.user_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn update_portfolio(
        &self,
        id: Uuid,
        patch: &UpdatePortfolio,
        at: Timestamp,
    ) -> StoreResult<u64> {
        let mut portfolios = self.portfolios.write().await;

        if !portfolios.contains_key(&id) {
            return Ok(0);
        }
        if let Some(subdomain) = &patch.subdomain {
            if subdomain_bound(&portfolios, subdomain, Some(id)) {
                return Err(StoreError::Conflict(format!(
                    "subdomain {subdomain} already bound"
                )));
            }
        }

        match portfolios.get_mut(&id) {
            Some(portfolio) => {
                portfolio.apply(patch, at.max(portfolio.updated_at));
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_portfolio(&self, id: Uuid) -> StoreResult<u64> {
        let removed = self.portfolios.write().await.remove(&id);
        Ok(u64::from(removed.is_some()))
    }

    async fn append_project(&self, portfolio_id: Uuid, project: &Project) -> StoreResult<u64> {
        let mut portfolios = self.portfolios.write().await;
        let Some(portfolio) = portfolios.get_mut(&portfolio_id) else {
            return Ok(0);
        };

        portfolio.projects.push(project.clone());
        touch(portfolio, project.created_at);
        Ok(1)
    }

    async fn update_project(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        patch: &UpdateProject,
        at: Timestamp,
    ) -> StoreResult<u64> {
        let mut portfolios = self.portfolios.write().await;
        let Some(portfolio) = portfolios.get_mut(&portfolio_id) else {
            return Ok(0);
        };
        let Some(project) = find_by_id_mut(&mut portfolio.projects, project_id) else {
            return Ok(0);
        };

        project.apply(patch, at);
        touch(portfolio, at);
        Ok(1)
    }

    async fn remove_project(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        at: Timestamp,
    ) -> StoreResult<u64> {
        let mut portfolios = self.portfolios.write().await;
        let Some(portfolio) = portfolios.get_mut(&portfolio_id) else {
            return Ok(0);
        };

        // The project owns its media, so removing it drops them too.
        let removed = remove_by_id(&mut portfolio.projects, project_id);
        if removed > 0 {
            touch(portfolio, at);
        }
        Ok(removed)
    }

    async fn append_section(&self, portfolio_id: Uuid, section: &Section) -> StoreResult<u64> {
        let mut portfolios = self.portfolios.write().await;
        let Some(portfolio) = portfolios.get_mut(&portfolio_id) else {
            return Ok(0);
        };

        portfolio.sections.push(section.clone());
        touch(portfolio, section.created_at);
        Ok(1)
    }

    async fn update_section(
        &self,
        portfolio_id: Uuid,
        section_id: Uuid,
        patch: &UpdateSection,
        at: Timestamp,
    ) -> StoreResult<u64> {
        let mut portfolios = self.portfolios.write().await;
        let Some(portfolio) = portfolios.get_mut(&portfolio_id) else {
            return Ok(0);
        };
        let Some(section) = find_by_id_mut(&mut portfolio.sections, section_id) else {
            return Ok(0);
        };

        section.apply(patch, at);
        touch(portfolio, at);
        Ok(1)
    }

    async fn remove_section(
        &self,
        portfolio_id: Uuid,
        section_id: Uuid,
        at: Timestamp,
    ) -> StoreResult<u64> {
        let mut portfolios = self.portfolios.write().await;
        let Some(portfolio) = portfolios.get_mut(&portfolio_id) else {
            return Ok(0);
        };

        let removed = remove_by_id(&mut portfolio.sections, section_id);
        if removed > 0 {
            touch(portfolio, at);
        }
        Ok(removed)
    }

    async fn append_media(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        media: &Media,
    ) -> StoreResult<u64> {
        let mut portfolios = self.portfolios.write().await;
        let Some(portfolio) = portfolios.get_mut(&portfolio_id) else {
            return Ok(0);
        };
        let Some(project) = find_by_id_mut(&mut portfolio.projects, project_id) else {
            return Ok(0);
        };

        project.media.push(media.clone());
        touch(portfolio, media.created_at);
        Ok(1)
    }

    async fn remove_media(
        &self,
        portfolio_id: Uuid,
        project_id: Uuid,
        media_id: Uuid,
        at: Timestamp,
    ) -> StoreResult<u64> {
        let mut portfolios = self.portfolios.write().await;
        let Some(portfolio) = portfolios.get_mut(&portfolio_id) else {
            return Ok(0);
        };
        let Some(project) = find_by_id_mut(&mut portfolio.projects, project_id) else {
            return Ok(0);
        };

        let removed = remove_by_id(&mut project.media, media_id);
        if removed > 0 {
            touch(portfolio, at);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::portfolio::PortfolioType;
    use crate::models::projects::CreateProject;
    use chrono::Utc;

    fn portfolio(subdomain: &str) -> Portfolio {
        let now = Utc::now();
        Portfolio {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Title".to_string(),
            description: "Description".to_string(),
            theme: "light".to_string(),
            layout: "grid".to_string(),
            portfolio_type: PortfolioType::Portfolio,
            subdomain: subdomain.to_string(),
            custom_domain: None,
            is_published: false,
            projects: Vec::new(),
            sections: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn insert_rejects_bound_subdomain() {
        let store = InMemoryPortfolioStore::new();
        store.insert_portfolio(portfolio("alice123")).await.unwrap();

        let err = store.insert_portfolio(portfolio("alice123")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_to_own_subdomain_is_not_a_conflict() {
        let store = InMemoryPortfolioStore::new();
        let p = store.insert_portfolio(portfolio("alice123")).await.unwrap();

        let patch = UpdatePortfolio {
            subdomain: Some("alice123".to_string()),
            ..Default::default()
        };
        let affected = store.update_portfolio(p.id, &patch, Utc::now()).await.unwrap();
        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn nested_writes_on_missing_children_affect_nothing() {
        let store = InMemoryPortfolioStore::new();
        let p = store.insert_portfolio(portfolio("bob1234")).await.unwrap();
        let now = Utc::now();

        let affected = store
            .update_project(p.id, Uuid::new_v4(), &UpdateProject::default(), now)
            .await
            .unwrap();
        assert_eq!(affected, 0);

        let affected = store
            .remove_media(p.id, Uuid::new_v4(), Uuid::new_v4(), now)
            .await
            .unwrap();
        assert_eq!(affected, 0);

        let project = Project::new(
            CreateProject {
                title: "Orphan".to_string(),
                description: "d".to_string(),
                content: "c".to_string(),
                tags: Vec::new(),
                order: 0,
            },
            now,
        );
        let affected = store.append_project(Uuid::new_v4(), &project).await.unwrap();
        assert_eq!(affected, 0);
    }
}
