//! Bearer-token guard for the `/api/v1` routes.
//!
//! ```text
//! Authorization: Bearer <API_KEY>
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::state::AppState;

pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match token {
        Some(token) if tokens_match(token, state.config.api_key.expose_secret()) => {
            next.run(request).await
        }
        Some(_) => {
            tracing::warn!("Rejected request with invalid API key");
            AppError::Unauthorized.into_response()
        }
        None => AppError::Unauthorized.into_response(),
    }
}

/// Constant-time comparison. Length is not secret.
fn tokens_match(presented: &str, expected: &str) -> bool {
    let (a, b) = (presented.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("secret-key", "secret-key"));
        assert!(!tokens_match("secret-kez", "secret-key"));
        assert!(!tokens_match("secret", "secret-key"));
        assert!(!tokens_match("", "secret-key"));
    }
}
