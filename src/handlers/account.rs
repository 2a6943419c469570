use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use garde::Validate;
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::{
    error::Result,
    handlers::auth::{clear_session_cookies, AuthResponse},
    models::user::CurrentUser,
    services::auth as auth_service,
    state::AppState,
    validation::auth::validate_new_password,
};

/// The request payload for a profile update.
#[derive(Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[garde(length(max = 64))]
    pub display_name: String,
}

/// The request payload for changing a user's password.
#[derive(Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[garde(length(max = 128))]
    pub current_password: String,
    #[garde(skip)]
    pub new_password: String,
    #[garde(skip)]
    pub confirm_password: String,
}

/// Returns the caller's profile.
pub async fn show(Extension(caller): Extension<CurrentUser>) -> Json<CurrentUser> {
    Json(caller)
}

/// Updates the caller's display name.
#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Response> {
    payload.validate()?;

    let user = auth_service::update_display_name(&state.db, caller.id, &payload.display_name).await?;

    let response = AuthResponse {
        success: true,
        message: "Profile updated.".to_string(),
        user: Some(CurrentUser::from(user)),
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles changing the caller's password.
#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Response> {
    payload.validate()?;
    validate_new_password(&payload.new_password, &payload.confirm_password)?;

    auth_service::change_password(
        &state.db,
        caller.id,
        &payload.current_password,
        &payload.new_password,
    )
    .await?;

    let response = AuthResponse {
        success: true,
        message: "Password changed.".to_string(),
        user: None,
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Deletes the caller's account and everything it owns.
#[axum::debug_handler]
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    cookies: Cookies,
) -> Result<Response> {
    auth_service::delete_account(&state.db, caller.id).await?;
    clear_session_cookies(&cookies);

    let response = AuthResponse {
        success: true,
        message: "Account deleted.".to_string(),
        user: None,
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}
