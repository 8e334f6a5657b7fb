pub mod auth;
pub mod health;
pub mod portfolio;

use actix_web::{HttpResponse, error, web};

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // Reject malformed IDs and bodies with the same JSON error shape the
    // handlers use.
    cfg.app_data(web::PathConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(serde_json::json!({ "error": message })),
        )
        .into()
    }));
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(serde_json::json!({ "error": message })),
        )
        .into()
    }));
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(serde_json::json!({ "error": message })),
        )
        .into()
    }));

    cfg.route("/health", web::get().to(health::health));

    // ── Auth routes (protected by JWT via the AuthenticatedUser extractor) ──
    cfg.service(web::scope("/auth").route("/me", web::get().to(auth::me)));

    // ── Portfolio routes (reads by id/subdomain are public) ──
    cfg.service(
        web::resource("/portfolios")
            .route(web::get().to(portfolio::get_my_portfolios))
            .route(web::post().to(portfolio::create_portfolio)),
    );
    cfg.service(
        web::resource("/portfolios/subdomain/{subdomain}")
            .route(web::get().to(portfolio::get_portfolio_by_subdomain)),
    );
    cfg.service(
        web::resource("/portfolios/{id}")
            .route(web::get().to(portfolio::get_portfolio))
            .route(web::put().to(portfolio::update_portfolio))
            .route(web::delete().to(portfolio::delete_portfolio)),
    );

    // ── Projects ──
    cfg.service(
        web::resource("/portfolios/{id}/projects").route(web::post().to(portfolio::add_project)),
    );
    cfg.service(
        web::resource("/portfolios/{id}/projects/{project_id}")
            .route(web::put().to(portfolio::update_project))
            .route(web::delete().to(portfolio::delete_project)),
    );

    // ── Sections ──
    cfg.service(
        web::resource("/portfolios/{id}/sections").route(web::post().to(portfolio::add_section)),
    );
    cfg.service(
        web::resource("/portfolios/{id}/sections/{section_id}")
            .route(web::put().to(portfolio::update_section))
            .route(web::delete().to(portfolio::delete_section)),
    );

    // ── Media ──
    cfg.service(
        web::resource("/portfolios/{id}/projects/{project_id}/media")
            .route(web::post().to(portfolio::upload_media)),
    );
    cfg.service(
        web::resource("/portfolios/{id}/projects/{project_id}/media/{media_id}")
            .route(web::delete().to(portfolio::delete_media)),
    );
}
