use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    error::AppError,
    models::user::CurrentUser,
    services::auth as auth_service,
    state::AppState,
};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "mt_session";

/// Attaches the session's user to the request, if there is one.
///
/// Runs on every route. Missing, malformed or expired sessions leave the
/// request anonymous, and so does a failed store lookup.
pub async fn resolve_user(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string());

    match auth_service::resolve_session(&state.db, token.as_deref()).await {
        Ok(Some(user)) => {
            tracing::debug!("✅ Request authenticated as user: {}", user.id);
            request.extensions_mut().insert(CurrentUser::from(user));
        }
        Ok(None) => {
            if token.is_some() {
                tracing::debug!("Ignoring invalid or expired session cookie");
            }
        }
        Err(e) => {
            tracing::warn!("❌ Session lookup failed, continuing anonymously: {}", e);
        }
    }

    next.run(request).await
}

/// A middleware that requires an authenticated caller.
pub async fn require_auth(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    if request.extensions().get::<CurrentUser>().is_none() {
        return Err(AppError::Unauthorized);
    }
    Ok(next.run(request).await)
}
