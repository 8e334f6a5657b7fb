//! Portfolio service behaviour against the in-memory store.
//!
//! Run with: `cargo test --test portfolio_service_test`
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use musefolio_backend::db::InMemoryPortfolioStore;
use musefolio_backend::models::media::{MediaType, UploadMedia};
use musefolio_backend::models::portfolio::{
    CreatePortfolio, Portfolio, PortfolioType, UpdatePortfolio,
};
use musefolio_backend::models::projects::{CreateProject, Project, UpdateProject};
use musefolio_backend::models::sections::{CreateSection, UpdateSection};
use musefolio_backend::services::{PortfolioError, PortfolioService, Resource};

fn service() -> PortfolioService {
    PortfolioService::new(Arc::new(InMemoryPortfolioStore::new()), "/media")
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

fn new_project(title: &str) -> CreateProject {
    CreateProject {
        title: title.to_string(),
        description: "A pedestrian bridge".to_string(),
        content: "Long-form write-up".to_string(),
        tags: vec!["steel".to_string()],
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

fn image(caption: &str) -> UploadMedia {
    UploadMedia {
        media_type: "image".to_string(),
        caption: caption.to_string(),
        order: 0,
    }
}

/// A portfolio owned by a fresh user, with one project.
async fn seeded(service: &PortfolioService, subdomain: &str) -> (Uuid, Portfolio, Project) {
    let owner = Uuid::new_v4();
    let portfolio = service.create(owner, new_portfolio(subdomain)).await.unwrap();
    let project = service
        .add_project(portfolio.id, owner, new_project("Bridge Design"))
        .await
        .unwrap();
    (owner, portfolio, project)
}

// ── Creation and validation ──

#[tokio::test]
async fn create_starts_empty_and_unpublished() {
    let service = service();
    let owner = Uuid::new_v4();

    let created = service.create(owner, new_portfolio("alice123")).await.unwrap();

    assert_eq!(created.user_id, owner);
    assert_eq!(created.portfolio_type, PortfolioType::Portfolio);
    assert!(!created.is_published);
    assert!(created.projects.is_empty());
    assert!(created.sections.is_empty());
    assert_eq!(created.created_at, created.updated_at);
}

#[tokio::test]
async fn create_rejects_missing_fields_and_short_subdomains() {
    let service = service();
    let owner = Uuid::new_v4();

    let mut input = new_portfolio("alice123");
    input.title.clear();
    let err = service.create(owner, input).await.unwrap_err();
    assert!(matches!(err, PortfolioError::Validation(_)));

    let err = service.create(owner, new_portfolio("ab")).await.unwrap_err();
    assert!(matches!(err, PortfolioError::Validation(_)));

    let err = service
        .create(owner, new_portfolio("not-alnum"))
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::Validation(_)));

    assert!(service.get_by_owner(owner).await.unwrap().is_empty());
}

// ── Subdomain uniqueness ──

#[tokio::test]
async fn duplicate_subdomain_on_create_is_taken() {
    let service = service();
    service
        .create(Uuid::new_v4(), new_portfolio("alice123"))
        .await
        .unwrap();

    let err = service
        .create(Uuid::new_v4(), new_portfolio("alice123"))
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::SubdomainTaken));
}

#[tokio::test]
async fn duplicate_subdomain_on_update_leaves_both_unchanged() {
    let service = service();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let a = service.create(alice, new_portfolio("alice123")).await.unwrap();
    let b = service.create(bob, new_portfolio("bob12345")).await.unwrap();

    let patch = UpdatePortfolio {
        subdomain: Some("alice123".to_string()),
        title: Some("Stolen".to_string()),
        ..Default::default()
    };
    let err = service.update(b.id, bob, patch).await.unwrap_err();
    assert!(matches!(err, PortfolioError::SubdomainTaken));

    assert_eq!(service.get_by_id(a.id).await.unwrap(), a);
    assert_eq!(service.get_by_id(b.id).await.unwrap(), b);
}

#[tokio::test]
async fn keeping_own_subdomain_is_not_a_conflict() {
    let service = service();
    let owner = Uuid::new_v4();
    let p = service.create(owner, new_portfolio("alice123")).await.unwrap();

    let patch = UpdatePortfolio {
        subdomain: Some("alice123".to_string()),
        ..Default::default()
    };
    let updated = service.update(p.id, owner, patch).await.unwrap();
    assert_eq!(updated.subdomain, "alice123");
}

#[tokio::test]
async fn released_subdomain_can_be_claimed() {
    let service = service();
    let alice = Uuid::new_v4();
    let p = service.create(alice, new_portfolio("alice123")).await.unwrap();

    let patch = UpdatePortfolio {
        subdomain: Some("alice456".to_string()),
        ..Default::default()
    };
    service.update(p.id, alice, patch).await.unwrap();

    let claimed = service
        .create(Uuid::new_v4(), new_portfolio("alice123"))
        .await
        .unwrap();
    assert_eq!(
        service.get_by_subdomain("alice123").await.unwrap().id,
        claimed.id
    );
}

// ── Ownership ──

#[tokio::test]
async fn foreign_requester_is_unauthorized_and_nothing_changes() {
    let service = service();
    let (owner, portfolio, project) = seeded(&service, "alice123").await;
    let section = service
        .add_section(portfolio.id, owner, new_section())
        .await
        .unwrap();
    let media = service
        .add_media(portfolio.id, project.id, owner, image(""), "span.jpg")
        .await
        .unwrap();
    let before = service.get_by_id(portfolio.id).await.unwrap();
    let mallory = Uuid::new_v4();

    let results = vec![
        service
            .update(portfolio.id, mallory, UpdatePortfolio::default())
            .await
            .map(|_| ()),
        service
            .add_project(portfolio.id, mallory, new_project("Intruder"))
            .await
            .map(|_| ()),
        service
            .update_project(portfolio.id, project.id, mallory, UpdateProject::default())
            .await
            .map(|_| ()),
        service
            .add_section(portfolio.id, mallory, new_section())
            .await
            .map(|_| ()),
        service
            .update_section(portfolio.id, section.id, mallory, UpdateSection::default())
            .await
            .map(|_| ()),
        service
            .add_media(portfolio.id, project.id, mallory, image(""), "x.png")
            .await
            .map(|_| ()),
        service
            .delete_media(portfolio.id, project.id, media.id, mallory)
            .await,
        service
            .delete_section(portfolio.id, section.id, mallory)
            .await,
        service
            .delete_project(portfolio.id, project.id, mallory)
            .await,
        service.delete(portfolio.id, mallory).await,
    ];

    for result in results {
        assert!(matches!(result, Err(PortfolioError::Unauthorized)));
    }
    assert_eq!(service.get_by_id(portfolio.id).await.unwrap(), before);
}

#[tokio::test]
async fn nonexistent_portfolio_is_not_found_for_any_requester() {
    let service = service();
    let missing = Uuid::new_v4();
    let anyone = Uuid::new_v4();

    let results = vec![
        service
            .update(missing, anyone, UpdatePortfolio::default())
            .await
            .map(|_| ()),
        service.delete(missing, anyone).await,
        service
            .add_project(missing, anyone, new_project("Ghost"))
            .await
            .map(|_| ()),
        service
            .add_section(missing, anyone, new_section())
            .await
            .map(|_| ()),
        service
            .add_media(missing, Uuid::new_v4(), anyone, image(""), "a.png")
            .await
            .map(|_| ()),
    ];

    for result in results {
        assert!(matches!(
            result,
            Err(PortfolioError::NotFound(Resource::Portfolio))
        ));
    }
}

#[tokio::test]
async fn nonexistent_children_are_not_found() {
    let service = service();
    let (owner, portfolio, project) = seeded(&service, "alice123").await;

    let err = service
        .update_project(portfolio.id, Uuid::new_v4(), owner, UpdateProject::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::NotFound(Resource::Project)));

    let err = service
        .delete_section(portfolio.id, Uuid::new_v4(), owner)
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::NotFound(Resource::Section)));

    let err = service
        .add_media(portfolio.id, Uuid::new_v4(), owner, image(""), "a.png")
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::NotFound(Resource::Project)));

    let err = service
        .delete_media(portfolio.id, project.id, Uuid::new_v4(), owner)
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::NotFound(Resource::Media)));
}

// ── Partial updates ──

#[tokio::test]
async fn empty_update_only_advances_updated_at() {
    let service = service();
    let owner = Uuid::new_v4();
    let before = service.create(owner, new_portfolio("alice123")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    let after = service
        .update(before.id, owner, UpdatePortfolio::default())
        .await
        .unwrap();

    assert!(after.updated_at > before.updated_at);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.title, before.title);
    assert_eq!(after.description, before.description);
    assert_eq!(after.theme, before.theme);
    assert_eq!(after.layout, before.layout);
    assert_eq!(after.subdomain, before.subdomain);
    assert_eq!(after.portfolio_type, before.portfolio_type);
    assert_eq!(after.is_published, before.is_published);
}

#[tokio::test]
async fn present_empty_string_replaces_value() {
    let service = service();
    let owner = Uuid::new_v4();
    let p = service.create(owner, new_portfolio("alice123")).await.unwrap();

    let patch = UpdatePortfolio {
        description: Some(String::new()),
        is_published: Some(true),
        portfolio_type: Some(PortfolioType::Cv),
        ..Default::default()
    };
    let updated = service.update(p.id, owner, patch).await.unwrap();

    assert_eq!(updated.description, "");
    assert!(updated.is_published);
    assert_eq!(updated.portfolio_type, PortfolioType::Cv);
    assert_eq!(updated.title, p.title);
}

#[tokio::test]
async fn custom_domain_can_be_set_and_cleared() {
    let service = service();
    let owner = Uuid::new_v4();
    let p = service.create(owner, new_portfolio("alice123")).await.unwrap();

    let set = UpdatePortfolio {
        custom_domain: Some(Some("alice.dev".to_string())),
        ..Default::default()
    };
    let updated = service.update(p.id, owner, set).await.unwrap();
    assert_eq!(updated.custom_domain.as_deref(), Some("alice.dev"));

    let untouched = service
        .update(p.id, owner, UpdatePortfolio::default())
        .await
        .unwrap();
    assert_eq!(untouched.custom_domain.as_deref(), Some("alice.dev"));

    let clear = UpdatePortfolio {
        custom_domain: Some(None),
        ..Default::default()
    };
    let cleared = service.update(p.id, owner, clear).await.unwrap();
    assert_eq!(cleared.custom_domain, None);
}

#[tokio::test]
async fn nested_update_touches_only_its_target() {
    let service = service();
    let (owner, portfolio, first) = seeded(&service, "alice123").await;
    let second = service
        .add_project(portfolio.id, owner, new_project("Tower"))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    let patch = UpdateProject {
        tags: Some(Vec::new()),
        ..Default::default()
    };
    let updated = service
        .update_project(portfolio.id, second.id, owner, patch)
        .await
        .unwrap();
    assert!(updated.tags.is_empty());
    assert_eq!(updated.title, "Tower");
    assert!(updated.updated_at > second.updated_at);

    let reloaded = service.get_by_id(portfolio.id).await.unwrap();
    assert_eq!(reloaded.projects.len(), 2);
    assert_eq!(reloaded.projects[0], first);
    assert!(reloaded.updated_at > portfolio.updated_at);
}

#[tokio::test]
async fn section_lifecycle() {
    let service = service();
    let owner = Uuid::new_v4();
    let p = service.create(owner, new_portfolio("alice123")).await.unwrap();

    let mut input = new_section();
    input.section_type.clear();
    let err = service.add_section(p.id, owner, input).await.unwrap_err();
    assert!(matches!(err, PortfolioError::Validation(_)));

    let section = service.add_section(p.id, owner, new_section()).await.unwrap();
    let patch = UpdateSection {
        order: Some(3),
        ..Default::default()
    };
    let updated = service
        .update_section(p.id, section.id, owner, patch)
        .await
        .unwrap();
    assert_eq!(updated.order, 3);
    assert_eq!(updated.title, section.title);

    service.delete_section(p.id, section.id, owner).await.unwrap();
    assert!(service.get_by_id(p.id).await.unwrap().sections.is_empty());
}

// ── Cascades ──

#[tokio::test]
async fn deleting_a_project_drops_its_media() {
    let service = service();
    let (owner, portfolio, project) = seeded(&service, "alice123").await;
    let media = service
        .add_media(portfolio.id, project.id, owner, image("Span"), "span.jpg")
        .await
        .unwrap();

    service
        .delete_project(portfolio.id, project.id, owner)
        .await
        .unwrap();

    let err = service
        .delete_media(portfolio.id, project.id, media.id, owner)
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::NotFound(_)));
    assert!(service.get_by_id(portfolio.id).await.unwrap().projects.is_empty());
}

#[tokio::test]
async fn deleting_a_portfolio_frees_everything() {
    let service = service();
    let (owner, portfolio, _) = seeded(&service, "alice123").await;

    service.delete(portfolio.id, owner).await.unwrap();

    let err = service.get_by_id(portfolio.id).await.unwrap_err();
    assert!(matches!(err, PortfolioError::NotFound(Resource::Portfolio)));
    let err = service.get_by_subdomain("alice123").await.unwrap_err();
    assert!(matches!(err, PortfolioError::NotFound(Resource::Portfolio)));
    assert!(service.get_by_owner(owner).await.unwrap().is_empty());
}

// ── Media rules ──

#[tokio::test]
async fn image_upload_records_url() {
    let service = service();
    let (owner, portfolio, project) = seeded(&service, "alice123").await;

    let media = service
        .add_media(portfolio.id, project.id, owner, image("Hero"), "photo.png")
        .await
        .unwrap();

    assert_eq!(media.media_type, MediaType::Image);
    assert_eq!(media.caption, "Hero");
    assert_eq!(
        media.url,
        format!("/media/{}/{}/photo.png", portfolio.id, project.id)
    );
}

#[tokio::test]
async fn mismatched_or_unknown_media_types_are_rejected() {
    let service = service();
    let (owner, portfolio, project) = seeded(&service, "alice123").await;

    let err = service
        .add_media(portfolio.id, project.id, owner, image(""), "photo.exe")
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidMediaType));

    let spreadsheet = UploadMedia {
        media_type: "spreadsheet".to_string(),
        caption: String::new(),
        order: 0,
    };
    let err = service
        .add_media(portfolio.id, project.id, owner, spreadsheet, "photo.png")
        .await
        .unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidMediaType));

    let reloaded = service.get_by_id(portfolio.id).await.unwrap();
    assert!(reloaded.projects[0].media.is_empty());
}

#[tokio::test]
async fn path_like_filenames_are_rejected() {
    let service = service();
    let (owner, portfolio, project) = seeded(&service, "alice123").await;

    for filename in ["../escape.png", "nested/photo.png", ".."] {
        let err = service
            .add_media(portfolio.id, project.id, owner, image(""), filename)
            .await
            .unwrap_err();
        assert!(matches!(err, PortfolioError::Validation(_)), "{filename}");
    }
}

// ── End to end ──

#[tokio::test]
async fn build_and_fetch_a_site_by_subdomain() {
    let service = service();
    let owner = Uuid::new_v4();

    let portfolio = service.create(owner, new_portfolio("alice123")).await.unwrap();
    let project = service
        .add_project(portfolio.id, owner, new_project("Bridge Design"))
        .await
        .unwrap();
    service
        .add_media(portfolio.id, project.id, owner, image(""), "span.jpg")
        .await
        .unwrap();
    let patch = UpdateProject {
        order: Some(2),
        ..Default::default()
    };
    service
        .update_project(portfolio.id, project.id, owner, patch)
        .await
        .unwrap();

    let site = service.get_by_subdomain("alice123").await.unwrap();

    assert_eq!(site.projects.len(), 1);
    let project = &site.projects[0];
    assert_eq!(project.title, "Bridge Design");
    assert_eq!(project.order, 2);
    assert_eq!(project.media.len(), 1);
    assert!(project.media[0].url.ends_with("/span.jpg"));
}
