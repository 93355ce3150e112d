pub mod calls;
pub mod health;
pub mod leaderboard;
pub mod refresh;
pub mod snapshots;

use crate::config::Config;
use crate::datasource::MarketDataSource;
use crate::db::Repository;
use crate::engine::TimeDecay;
use crate::refresh::Refresher;
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub refresher: Arc<Refresher>,
    pub datasource: Arc<dyn MarketDataSource>,
    pub decay: Arc<dyn TimeDecay>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        repo: Arc<Repository>,
        refresher: Arc<Refresher>,
        datasource: Arc<dyn MarketDataSource>,
        decay: Arc<dyn TimeDecay>,
        config: Config,
    ) -> Self {
        Self {
            repo,
            refresher,
            datasource,
            decay,
            config,
        }
    }
}

/// Success envelope; errors render through `AppError` as
/// `{ success: false, error }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            data: Some(data),
        })
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
        .route("/api/calls", get(calls::list_calls).post(calls::create_call))
        .route("/api/calls/:contract_address", get(calls::get_call))
        .route("/api/refresh/:contract_address", post(refresh::refresh_contract))
        .route("/api/refresh-all", post(refresh::refresh_all))
        .route("/api/leaderboard", get(leaderboard::get_leaderboard))
        .route(
            "/api/tokens/:contract_address/snapshots",
            get(snapshots::get_snapshots),
        )
        .layer(cors)
        .with_state(state)
}
