use chrono::Utc;
use deadpool_postgres::Pool;

use crate::crypto::{password, token};
use crate::error::{AppError, Result};
use crate::models::session::{IssuedSession, Session};
use crate::models::user::User;
use crate::repositories::{session as session_repo, user as user_repo};
use crate::validation::auth::{normalize_email, validate_display_name, validate_password};

/// Creates a new user.
///
/// # Arguments
///
/// * `db` - The database connection pool.
/// * `email` - The user's email. Stored trimmed and lowercased.
/// * `display_name` - The user's display name.
/// * `password` - The user's password. Only its Argon2id hash is stored.
///
/// # Returns
///
/// A `Result` containing the created `User`, or `DuplicateEmail`.
pub async fn create_user(
    db: &Pool,
    email: &str,
    display_name: &str,
    password: &str,
) -> Result<User> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AppError::Validation("Email is required.".to_string()));
    }
    let display_name = validate_display_name(display_name)?;
    validate_password(password)?;

    tracing::debug!("🔐 Creating user: {}", email);
    let hashed_password = password::hash_password(password)?;

    let user = user_repo::create_user(db, &email, &display_name, &hashed_password).await?;

    tracing::info!("✅ User created with ID: {}", user.id);
    Ok(user)
}

/// Authenticates a user.
///
/// Unknown email and wrong password fail identically with
/// `InvalidCredentials`.
///
/// # Returns
///
/// A `Result` containing the authenticated `User`.
pub async fn authenticate(db: &Pool, email: &str, password: &str) -> Result<User> {
    let email = normalize_email(email);
    tracing::debug!("🔐 Authenticating user: {}", email);

    let Some(user) = user_repo::find_by_email(db, &email).await? else {
        // Burn comparable time so response latency does not reveal the miss.
        let _ = password::verify_password(password, password::dummy_hash());
        return Err(AppError::InvalidCredentials);
    };

    if !password::verify_password(password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    tracing::info!("✅ User authenticated: {}", user.id);
    Ok(user)
}

/// Issues a new session for `user` that expires `ttl` from now.
pub async fn create_session(db: &Pool, user: &User, ttl: chrono::Duration) -> Result<IssuedSession> {
    let token = token::generate_session_token();
    let token_hash = token::session_token_digest(&token)
        .ok_or_else(|| AppError::Internal("Generated malformed session token".to_string()))?;

    let now = Utc::now();
    let session = Session {
        user_id: user.id,
        created_at: now,
        expires_at: now + ttl,
    };

    session_repo::insert_session(db, &token_hash, &session).await?;

    tracing::info!("✅ Session issued for user: {}", user.id);
    Ok(IssuedSession { token, session })
}

/// Resolves a session token to its user.
///
/// Absent, malformed, unknown and expired tokens all yield `Ok(None)`:
/// the request is anonymous, not failed. Expired rows are left in place.
pub async fn resolve_session(db: &Pool, token: Option<&str>) -> Result<Option<User>> {
    let Some(token_hash) = token.and_then(token::session_token_digest) else {
        return Ok(None);
    };

    let Some((session, user)) = session_repo::find_with_user(db, &token_hash).await? else {
        tracing::debug!("Unknown session token");
        return Ok(None);
    };

    if !session.is_active_at(Utc::now()) {
        tracing::debug!("Session expired for user: {}", session.user_id);
        return Ok(None);
    }

    Ok(Some(user))
}

/// Deletes a session. Unknown or malformed tokens are ignored.
pub async fn delete_session(db: &Pool, token: &str) -> Result<()> {
    if let Some(token_hash) = token::session_token_digest(token) {
        session_repo::delete_session(db, &token_hash).await?;
    }
    Ok(())
}

/// Changes a user's password.
///
/// # Arguments
///
/// * `db` - The database connection pool.
/// * `user_id` - The ID of the user.
/// * `current_password` - Must verify against the stored hash.
/// * `new_password` - The replacement password.
///
/// # Returns
///
/// A `Result<()>`, `InvalidPassword` if `current_password` is wrong.
pub async fn change_password(
    db: &Pool,
    user_id: i64,
    current_password: &str,
    new_password: &str,
) -> Result<()> {
    tracing::info!("🔑 Changing password for user: {}", user_id);
    validate_password(new_password)?;

    let user = user_repo::find_by_id(db, user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !password::verify_password(current_password, &user.password_hash)? {
        return Err(AppError::InvalidPassword);
    }

    let new_hashed_password = password::hash_password(new_password)?;
    user_repo::update_password(db, user_id, &new_hashed_password).await?;

    tracing::info!("✅ Password changed for user: {}", user_id);
    Ok(())
}

/// Updates the display name and returns the updated user.
pub async fn update_display_name(db: &Pool, user_id: i64, display_name: &str) -> Result<User> {
    let display_name = validate_display_name(display_name)?;
    let user = user_repo::update_display_name(db, user_id, &display_name).await?;
    tracing::info!("✅ Profile updated for user: {}", user_id);
    Ok(user)
}

/// Deletes an account with its sessions, decks and deck lines as one unit.
pub async fn delete_account(db: &Pool, user_id: i64) -> Result<()> {
    user_repo::delete_user_cascade(db, user_id).await?;
    tracing::info!("🗑️ Account deleted: {}", user_id);
    Ok(())
}
