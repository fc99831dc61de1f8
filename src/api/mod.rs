pub mod health;
pub mod pnl;
pub mod positions;
pub mod redistribution;
pub mod wallets;

use crate::config::Config;
use crate::orchestration::PositionService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub positions: Arc<PositionService>,
}

impl AppState {
    pub fn new(config: Config, positions: Arc<PositionService>) -> Self {
        Self { config, positions }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/positions", post(positions::reconstruct_position))
        .route("/v1/positions/batch", post(positions::reconstruct_batch))
        .route("/v1/pnl", post(pnl::compute_pnl))
        .route(
            "/v1/redistribution",
            post(redistribution::redistribute_group),
        )
        .route("/v1/wallets/import", post(wallets::import_wallets))
        .route("/v1/wallets/export", post(wallets::export_wallets))
        .layer(cors)
        .with_state(state)
}
