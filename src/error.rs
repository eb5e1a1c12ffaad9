use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Terminal outcome of a gate stage that refused the request.
///
/// Every variant is an ordinary business decision and renders as `403 Forbidden`
/// with the message as a plain-text body.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Access denied: Chat is only available from 9PM to 6AM")]
    OutOfAllowedWindow,
    #[error("Rate limit exceeded: Maximum {max_requests} messages per minute allowed")]
    RateLimitExceeded { max_requests: usize },
    #[error("Authentication required")]
    AuthenticationRequired,
    #[error("Admin or moderator access required")]
    InsufficientRole,
}

impl Rejection {
    /// Stable label for logs and the `kind` metric label.
    pub const fn kind(&self) -> &'static str {
        match self {
            Rejection::OutOfAllowedWindow => "out_of_allowed_window",
            Rejection::RateLimitExceeded { .. } => "rate_limit_exceeded",
            Rejection::AuthenticationRequired => "authentication_required",
            Rejection::InsufficientRole => "insufficient_role",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (StatusCode::FORBIDDEN, self.to_string()).into_response()
    }
}

// Failures of the server itself, surfaced from main
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Server stopped unexpectedly")]
    Serve(#[source] std::io::Error),
}
