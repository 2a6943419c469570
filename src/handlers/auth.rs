use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use tower_cookies::{Cookie, Cookies};
use tower_cookies::cookie::time::Duration;

use crate::{
    config::Config,
    crypto::csrf::generate_csrf_token,
    error::Result,
    middleware_layer::{auth::SESSION_COOKIE, csrf::CSRF_COOKIE},
    models::user::{CurrentUser, User},
    services::auth as auth_service,
    state::AppState,
};

/// The request payload for user registration.
#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1, max = 32))]
    pub display_name: String,
    #[garde(length(min = 8, max = 128))]
    pub password: String,
}

/// The request payload for user login.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[garde(length(min = 1, max = 320))]
    pub email: String,
    #[garde(length(min = 1, max = 128))]
    pub password: String,
}

/// The response payload for authentication-related requests.
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<CurrentUser>,
}

/// Creates a cookie with the given name, value, and max age.
fn create_secure_cookie(
    name: &'static str,
    value: String,
    max_age: Duration,
    http_only: bool,
    secure: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(http_only);
    cookie.set_secure(secure);
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(max_age);
    cookie.set_path("/");
    cookie
}

/// Sets the session cookie and a fresh CSRF cookie.
pub(crate) fn set_session_cookies(cookies: &Cookies, config: &Config, token: String) {
    let max_age = Duration::days(config.session_duration_days);
    cookies.add(create_secure_cookie(
        SESSION_COOKIE,
        token,
        max_age,
        true,
        config.secure_cookies,
    ));
    // Readable by scripts so they can echo it in the CSRF header.
    cookies.add(create_secure_cookie(
        CSRF_COOKIE,
        generate_csrf_token(),
        max_age,
        false,
        config.secure_cookies,
    ));
}

/// Expires the session and CSRF cookies on the client.
pub(crate) fn clear_session_cookies(cookies: &Cookies) {
    for name in [SESSION_COOKIE, CSRF_COOKIE] {
        let mut cookie = Cookie::new(name, "");
        cookie.set_max_age(Duration::seconds(0));
        cookie.set_path("/");
        cookies.remove(cookie);
    }
}

async fn start_session(state: &AppState, cookies: &Cookies, user: &User) -> Result<()> {
    let issued = auth_service::create_session(&state.db, user, state.config.session_ttl()).await?;
    set_session_cookies(cookies, &state.config, issued.token);
    Ok(())
}

/// Handles user registration.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response> {
    payload.validate()?;
    tracing::info!("📝 Register attempt for: {}", payload.email.trim());

    let user = auth_service::create_user(
        &state.db,
        &payload.email,
        &payload.display_name,
        &payload.password,
    )
    .await?;

    start_session(&state, &cookies, &user).await?;

    let response = AuthResponse {
        success: true,
        message: "Account created. Welcome to Mana Tomb!".to_string(),
        user: Some(CurrentUser::from(user)),
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Handles user login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    payload.validate()?;

    let user = auth_service::authenticate(&state.db, &payload.email, &payload.password).await?;
    start_session(&state, &cookies, &user).await?;

    let response = AuthResponse {
        success: true,
        message: "Welcome back!".to_string(),
        user: Some(CurrentUser::from(user)),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user logout.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    cookies: Cookies,
) -> Result<Response> {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        auth_service::delete_session(&state.db, cookie.value()).await?;
    }
    clear_session_cookies(&cookies);

    tracing::info!("👋 User logged out: {}", caller.id);

    let response = AuthResponse {
        success: true,
        message: "Logged out.".to_string(),
        user: None,
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
