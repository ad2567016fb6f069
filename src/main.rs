use axum::Router;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod entities;
mod error;
mod handler;
mod openapi;
mod repo;
mod schema;
mod service;
mod state;

use crate::{openapi::ApiDoc, state::AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = AppState::new().await;

    let app = Router::new()
        .merge(handler::health::routes())
        .merge(handler::auth::signup::routes(state.clone()))
        .merge(handler::auth::password::routes(state.clone()))
        .merge(handler::accounts::routes(state.clone()))
        .merge(handler::lands::routes(state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let port = state.config().port();
    let bind_addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|_| panic!("failed to bind to {}", bind_addr));

    tracing::info!("listening on {bind_addr}");

    axum::serve(listener, app)
        .await
        .expect("server error");
}
