use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::info;

use crate::metrics::{ADMITTED_TOTAL, REJECTED_TOTAL, REQUEST_TOTAL, TRACKED_CLIENTS};
use crate::models::{Principal, RequestDescriptor};
use crate::state::AppState;

pub const REQUEST_LOG_TARGET: &str = "request_log";

// One line per request: "<timestamp> - User: <name> - Path: <path>"
pub async fn request_logger(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let user = Principal::from_headers(request.headers())
        .map(|principal| principal.username)
        .unwrap_or_else(|| "Anonymous".to_string());

    info!(
        target: REQUEST_LOG_TARGET,
        "{} - User: {} - Path: {}",
        state.clock.now(),
        user,
        request.uri().path()
    );

    next.run(request).await
}

// Drives the admission chain; the request reaches `next` untouched or not at all.
pub async fn admission(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    REQUEST_TOTAL.inc();

    let descriptor = RequestDescriptor::from_request(&request, state.clock.now());
    let outcome = state.gate.run(&descriptor, || next.run(request)).await;

    TRACKED_CLIENTS.set(state.rate_gate.tracked_clients() as f64);

    match outcome {
        Ok(response) => {
            ADMITTED_TOTAL.inc();
            response
        }
        Err(rejection) => {
            REJECTED_TOTAL.with_label_values(&[rejection.kind()]).inc();
            rejection.into_response()
        }
    }
}
