use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::cache::{CacheData, keys};
use crate::config::AppConfig;
use crate::models::media::UploadMedia;
use crate::models::portfolio::{CreatePortfolio, Portfolio, UpdatePortfolio};
use crate::models::projects::{CreateProject, UpdateProject};
use crate::models::sections::{CreateSection, UpdateSection};
use crate::services::{PortfolioError, PortfolioService};

fn error_response(err: PortfolioError) -> HttpResponse {
    let body = serde_json::json!({ "error": err.to_string() });
    match err {
        PortfolioError::NotFound(_) => HttpResponse::NotFound().json(body),
        PortfolioError::Unauthorized => HttpResponse::Forbidden().json(body),
        PortfolioError::SubdomainTaken => HttpResponse::Conflict().json(body),
        PortfolioError::InvalidMediaType | PortfolioError::Validation(_) => {
            HttpResponse::BadRequest().json(body)
        }
        PortfolioError::Store(e) => {
            tracing::error!("Store failure: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Database error",
            }))
        }
    }
}

/// Retire every cached subdomain lookup by moving to a new generation. A
/// failure only costs freshness until the TTL runs out.
async fn invalidate_subdomains(cache: &CacheData) {
    if let Err(e) = cache.incr(keys::subdomain_generation()).await {
        tracing::warn!("Cache invalidation failed: {e}");
    }
}

// ── Portfolio ──

/// GET /api/v1/portfolios: list the authenticated user's portfolios.
pub async fn get_my_portfolios(
    auth_user: AuthenticatedUser,
    service: web::Data<PortfolioService>,
) -> impl Responder {
    match service.get_by_owner(auth_user.0.id).await {
        Ok(items) => HttpResponse::Ok().json(items),
        Err(e) => error_response(e),
    }
}

/// POST /api/v1/portfolios: create a portfolio owned by the caller.
pub async fn create_portfolio(
    auth_user: AuthenticatedUser,
    service: web::Data<PortfolioService>,
    cache: web::Data<CacheData>,
    body: web::Json<CreatePortfolio>,
) -> impl Responder {
    match service.create(auth_user.0.id, body.into_inner()).await {
        Ok(created) => {
            invalidate_subdomains(&cache).await;
            HttpResponse::Created().json(created)
        }
        Err(e) => error_response(e),
    }
}

/// GET /api/v1/portfolios/{id}: public.
pub async fn get_portfolio(
    service: web::Data<PortfolioService>,
    path: web::Path<Uuid>,
) -> impl Responder {
    match service.get_by_id(path.into_inner()).await {
        Ok(item) => HttpResponse::Ok().json(item),
        Err(e) => error_response(e),
    }
}

/// GET /api/v1/portfolios/subdomain/{subdomain}: public, served from cache
/// when possible.
pub async fn get_portfolio_by_subdomain(
    service: web::Data<PortfolioService>,
    cache: web::Data<CacheData>,
    config: web::Data<AppConfig>,
    path: web::Path<String>,
) -> impl Responder {
    let subdomain = path.into_inner();

    // The generation is read before the store so a fill that races a
    // mutation is filed under the generation that mutation retires.
    let cache_key = match cache.counter(keys::subdomain_generation()).await {
        Ok(generation) => Some(keys::portfolio_subdomain(generation, &subdomain)),
        Err(e) => {
            tracing::warn!("Cache error: {}", e);
            None
        }
    };

    if let Some(key) = &cache_key {
        match cache.get::<Portfolio>(key).await {
            Ok(Some(cached)) => return HttpResponse::Ok().json(cached),
            Ok(None) => {}
            // Cache error - fall back to the store
            Err(e) => tracing::warn!("Cache error: {}", e),
        }
    }

    match service.get_by_subdomain(&subdomain).await {
        Ok(item) => {
            if let Some(key) = &cache_key {
                let ttl = config.cache.subdomain_ttl.as_secs();
                if let Err(e) = cache.set(key, &item, ttl).await {
                    tracing::warn!("Cache write failed: {e}");
                }
            }
            HttpResponse::Ok().json(item)
        }
        Err(e) => error_response(e),
    }
}

/// PUT /api/v1/portfolios/{id}
pub async fn update_portfolio(
    auth_user: AuthenticatedUser,
    service: web::Data<PortfolioService>,
    cache: web::Data<CacheData>,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePortfolio>,
) -> impl Responder {
    match service
        .update(path.into_inner(), auth_user.0.id, body.into_inner())
        .await
    {
        Ok(updated) => {
            invalidate_subdomains(&cache).await;
            HttpResponse::Ok().json(updated)
        }
        Err(e) => error_response(e),
    }
}

/// DELETE /api/v1/portfolios/{id}
pub async fn delete_portfolio(
    auth_user: AuthenticatedUser,
    service: web::Data<PortfolioService>,
    cache: web::Data<CacheData>,
    path: web::Path<Uuid>,
) -> impl Responder {
    let id = path.into_inner();
    match service.delete(id, auth_user.0.id).await {
        Ok(()) => {
            invalidate_subdomains(&cache).await;
            HttpResponse::Ok().json(serde_json::json!({
                "message": format!("Portfolio {id} deleted"),
            }))
        }
        Err(e) => error_response(e),
    }
}

// ── Projects ──

/// POST /api/v1/portfolios/{id}/projects
pub async fn add_project(
    auth_user: AuthenticatedUser,
    service: web::Data<PortfolioService>,
    cache: web::Data<CacheData>,
    path: web::Path<Uuid>,
    body: web::Json<CreateProject>,
) -> impl Responder {
    match service
        .add_project(path.into_inner(), auth_user.0.id, body.into_inner())
        .await
    {
        Ok(project) => {
            invalidate_subdomains(&cache).await;
            HttpResponse::Created().json(project)
        }
        Err(e) => error_response(e),
    }
}

/// PUT /api/v1/portfolios/{id}/projects/{project_id}
pub async fn update_project(
    auth_user: AuthenticatedUser,
    service: web::Data<PortfolioService>,
    cache: web::Data<CacheData>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<UpdateProject>,
) -> impl Responder {
    let (portfolio_id, project_id) = path.into_inner();
    match service
        .update_project(portfolio_id, project_id, auth_user.0.id, body.into_inner())
        .await
    {
        Ok(project) => {
            invalidate_subdomains(&cache).await;
            HttpResponse::Ok().json(project)
        }
        Err(e) => error_response(e),
    }
}

/// DELETE /api/v1/portfolios/{id}/projects/{project_id}
pub async fn delete_project(
    auth_user: AuthenticatedUser,
    service: web::Data<PortfolioService>,
    cache: web::Data<CacheData>,
    path: web::Path<(Uuid, Uuid)>,
) -> impl Responder {
    let (portfolio_id, project_id) = path.into_inner();
    match service
        .delete_project(portfolio_id, project_id, auth_user.0.id)
        .await
    {
        Ok(()) => {
            invalidate_subdomains(&cache).await;
            HttpResponse::NoContent().finish()
        }
        Err(e) => error_response(e),
    }
}

// ── Sections ──

/// POST /api/v1/portfolios/{id}/sections
pub async fn add_section(
    auth_user: AuthenticatedUser,
    service: web::Data<PortfolioService>,
    cache: web::Data<CacheData>,
    path: web::Path<Uuid>,
    body: web::Json<CreateSection>,
) -> impl Responder {
    match service
        .add_section(path.into_inner(), auth_user.0.id, body.into_inner())
        .await
    {
        Ok(section) => {
            invalidate_subdomains(&cache).await;
            HttpResponse::Created().json(section)
        }
        Err(e) => error_response(e),
    }
}

/// PUT /api/v1/portfolios/{id}/sections/{section_id}
pub async fn update_section(
    auth_user: AuthenticatedUser,
    service: web::Data<PortfolioService>,
    cache: web::Data<CacheData>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<UpdateSection>,
) -> impl Responder {
    let (portfolio_id, section_id) = path.into_inner();
    match service
        .update_section(portfolio_id, section_id, auth_user.0.id, body.into_inner())
        .await
    {
        Ok(section) => {
            invalidate_subdomains(&cache).await;
            HttpResponse::Ok().json(section)
        }
        Err(e) => error_response(e),
    }
}

/// DELETE /api/v1/portfolios/{id}/sections/{section_id}
pub async fn delete_section(
    auth_user: AuthenticatedUser,
    service: web::Data<PortfolioService>,
    cache: web::Data<CacheData>,
    path: web::Path<(Uuid, Uuid)>,
) -> impl Responder {
    let (portfolio_id, section_id) = path.into_inner();
    match service
        .delete_section(portfolio_id, section_id, auth_user.0.id)
        .await
    {
        Ok(()) => {
            invalidate_subdomains(&cache).await;
            HttpResponse::NoContent().finish()
        }
        Err(e) => error_response(e),
    }
}

// ── Media ──

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Left empty when absent so the media rules reject it as an invalid type.
    #[serde(rename = "type", default)]
    pub media_type: String,
    pub filename: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub order: i32,
}

async fn write_media_file(dir: &Path, filename: &str, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(filename), bytes).await
}

/// POST /api/v1/portfolios/{id}/projects/{project_id}/media?type=&filename=
///
/// The request body is the raw file. The Media element is recorded first;
/// if the bytes cannot be written it is removed again.
pub async fn upload_media(
    auth_user: AuthenticatedUser,
    service: web::Data<PortfolioService>,
    cache: web::Data<CacheData>,
    config: web::Data<AppConfig>,
    path: web::Path<(Uuid, Uuid)>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> impl Responder {
    let (portfolio_id, project_id) = path.into_inner();
    let requester = auth_user.0.id;
    let UploadQuery {
        media_type,
        filename,
        caption,
        order,
    } = query.into_inner();

    if body.is_empty() {
        return error_response(PortfolioError::Validation("file is required".to_string()));
    }

    let input = UploadMedia {
        media_type,
        caption,
        order,
    };
    let media = match service
        .add_media(portfolio_id, project_id, requester, input, &filename)
        .await
    {
        Ok(media) => media,
        Err(e) => return error_response(e),
    };

    let dir = config
        .media_dir
        .join(portfolio_id.to_string())
        .join(project_id.to_string());

    if let Err(e) = write_media_file(&dir, &filename, &body).await {
        tracing::error!(%portfolio_id, %project_id, "Failed to write media file {filename}: {e}");
        if let Err(undo) = service
            .delete_media(portfolio_id, project_id, media.id, requester)
            .await
        {
            tracing::error!(media_id = %media.id, "Failed to remove orphaned media element: {undo}");
        }
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": "Failed to store media file",
        }));
    }

    invalidate_subdomains(&cache).await;
    HttpResponse::Created().json(media)
}

/// DELETE /api/v1/portfolios/{id}/projects/{project_id}/media/{media_id}
pub async fn delete_media(
    auth_user: AuthenticatedUser,
    service: web::Data<PortfolioService>,
    cache: web::Data<CacheData>,
    path: web::Path<(Uuid, Uuid, Uuid)>,
) -> impl Responder {
    let (portfolio_id, project_id, media_id) = path.into_inner();
    match service
        .delete_media(portfolio_id, project_id, media_id, auth_user.0.id)
        .await
    {
        Ok(()) => {
            invalidate_subdomains(&cache).await;
            HttpResponse::NoContent().finish()
        }
        Err(e) => error_response(e),
    }
}
