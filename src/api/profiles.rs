use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, ProfileDto, auth};
use crate::db::Profile;
use crate::services::ProfileOutcome;

/// Resolves the caller's profile through the explicit request context.
async fn resolve(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
) -> Result<ProfileOutcome, ApiError> {
    let ctx = auth::request_context(session, headers, &state.config.identity.session_cookie).await;
    let outcome = state.profile_service.resolve(&ctx).await?;

    if let ProfileOutcome::Ready(profile) = &outcome {
        tracing::Span::current().record("user_id", &profile.user_id);
    }

    Ok(outcome)
}

/// GET /api/profile
/// Current user's profile, created on first visit
pub async fn get_current_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let response = match resolve(&state, &session, &headers).await? {
        ProfileOutcome::Ready(profile) => {
            Json(ApiResponse::success(ProfileDto::from(profile))).into_response()
        }
        ProfileOutcome::SignInRequired { redirect_to } => {
            Redirect::to(&redirect_to).into_response()
        }
    };

    Ok(response)
}

/// GET /
/// Server-rendered landing page for the signed-in user
pub async fn home_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let response = match resolve(&state, &session, &headers).await? {
        ProfileOutcome::Ready(profile) => Html(render_home(&profile)).into_response(),
        ProfileOutcome::SignInRequired { redirect_to } => {
            Redirect::to(&redirect_to).into_response()
        }
    };

    Ok(response)
}

fn render_home(profile: &Profile) -> String {
    let name = html_escape::encode_text(&profile.name);
    let username = html_escape::encode_text(&profile.username);
    let email = html_escape::encode_text(&profile.email);
    let image_url = html_escape::encode_double_quoted_attribute(&profile.image_url);

    format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{name}</title></head>
<body>
  <main>
    <img src="{image_url}" alt="" width="64" height="64">
    <h1>Welcome, {name}</h1>
    <p>@{username} &middot; {email}</p>
  </main>
</body>
</html>
"#
    )
}
