use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use ring::digest;
use secrecy::ExposeSecret;

use super::state::AppState;

/// Authentication error responses
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Authentication required.",
            AuthError::InvalidToken => "Invalid operator token.",
        };

        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Bearer")],
            message,
        )
            .into_response()
    }
}

/// Compares SHA-256 digests so the comparison time does not depend on how
/// much of the secret matched.
fn token_matches(presented: &str, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }
    let presented = digest::digest(&digest::SHA256, presented.as_bytes());
    let expected = digest::digest(&digest::SHA256, expected.as_bytes());
    presented.as_ref() == expected.as_ref()
}

/// Middleware that requires the operator bearer token
pub async fn require_operator(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingToken)?;

    if !token_matches(token.trim(), state.config.operator_token.expose_secret()) {
        tracing::warn!(path = %request.uri().path(), "Rejected operator request with invalid token");
        return Err(AuthError::InvalidToken);
    }

    Ok(next.run(request).await)
}
