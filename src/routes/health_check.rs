//! src/routes/health_check.rs

use actix_web::HttpResponse;

/// Liveness only: never touches the store or the cache.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "message": "API is working",
    }))
}
