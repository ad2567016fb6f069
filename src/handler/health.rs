use axum::{routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct Banner {
    pub message: &'static str,
}

#[derive(Serialize, ToSchema)]
pub struct Health {
    pub status: &'static str,
}

/// Root banner kept for frontends and uptime probes that hit `/`.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Server banner", body = Banner)
    )
)]
pub async fn root() -> Json<Banner> {
    Json(Banner {
        message: "Backend Server is running",
    })
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service health", body = Health)
    )
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub fn routes() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
}
