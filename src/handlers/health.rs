use actix_web::{HttpResponse, Responder};

/// GET /health and /api/v1/health: liveness check.
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
