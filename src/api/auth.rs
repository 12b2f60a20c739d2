use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;
use tower_sessions::{Session, cookie::Cookie};

use super::{ApiError, ApiResponse, AppState, MessageResponse, SessionRequest};
use crate::identity::{AuthOutcome, RequestContext};

/// Session key holding the provider token handed over via `POST /auth/session`.
pub const SESSION_TOKEN_KEY: &str = "session_token";

// ============================================================================
// Request context
// ============================================================================

/// Builds the explicit request context handed to the identity provider.
///
/// Sources, first match wins:
/// 1. Token stored in the server-side session
/// 2. The provider's session cookie
/// 3. `Authorization: Bearer <token>` header
pub async fn request_context(
    session: &Session,
    headers: &HeaderMap,
    cookie_name: &str,
) -> RequestContext {
    if let Ok(Some(token)) = session.get::<String>(SESSION_TOKEN_KEY).await {
        return RequestContext::with_session(token);
    }

    if let Some(token) = session_cookie(headers, cookie_name) {
        return RequestContext::with_session(token);
    }

    if let Some(token) = bearer_token(headers) {
        return RequestContext::with_session(token);
    }

    RequestContext::anonymous()
}

fn session_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == cookie_name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/session
/// Keep a provider session token in the server-side session after checking it
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SessionRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.session_token.trim().is_empty() {
        return Err(ApiError::validation("Session token is required"));
    }

    let ctx = RequestContext::with_session(payload.session_token.trim());
    let identity = match state
        .identity
        .current_user(&ctx)
        .await
        .map_err(|e| ApiError::identity_error(e.to_string()))?
    {
        AuthOutcome::Authenticated(identity) => identity,
        AuthOutcome::Unauthenticated => {
            return Err(ApiError::Unauthorized("Invalid session token".to_string()));
        }
    };

    if let Err(e) = session
        .insert(SESSION_TOKEN_KEY, payload.session_token.trim())
        .await
    {
        return Err(ApiError::internal(format!("Failed to create session: {e}")));
    }

    tracing::Span::current().record("user_id", &identity.id);
    tracing::info!(user_id = %identity.id, "Session established");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Signed in".to_string(),
    })))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}
