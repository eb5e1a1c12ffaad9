//! Night-only chat service whose handlers sit behind a request admission gate:
//! a wall-clock time window, a per-client sliding-window rate limit on mutating
//! requests, and a role check on moderation paths.

pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod rate_limit;
pub mod state;
pub mod time_window;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::error::ServerError;
use crate::handlers::{clear_messages, health_handler, list_messages, metrics_handler, post_message};
use crate::middleware::{admission, request_logger};
use crate::state::AppState;

// /health and /metrics stay outside the gate; every /api route goes through it
pub fn app(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/messages", get(list_messages).post(post_message))
        .route("/api/admin/messages", delete(clear_messages))
        .layer(axum_middleware::from_fn_with_state(state.clone(), admission));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .merge(api)
        .layer(axum_middleware::from_fn_with_state(state.clone(), request_logger))
        .with_state(state)
}

// Serves with ConnectInfo so the gate can fall back to the peer address
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), ServerError> {
    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(ServerError::Serve)
}
