use deadpool_postgres::Pool;
use crate::{
    error::{is_unique_violation, AppError, Result},
    models::user::User,
};

const USER_COLUMNS: &str = "id, email, display_name, password_hash, created_at";

/// Creates a new user in the database.
///
/// A second registration for the same email fails with `DuplicateEmail`.
pub async fn create_user(
    pool: &Pool,
    email: &str,
    display_name: &str,
    password_hash: &str,
) -> Result<User> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            r#"
            INSERT INTO users (email, display_name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .await?;

    let row = client
        .query_one(&stmt, &[&email, &display_name, &password_hash])
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "users_email_key") {
                AppError::DuplicateEmail
            } else {
                AppError::Database(e)
            }
        })?;

    Ok(User::try_from(&row)?)
}

/// Finds a user by their email address.
pub async fn find_by_email(pool: &Pool, email: &str) -> Result<Option<User>> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .await?;
    let row = client.query_opt(&stmt, &[&email]).await?;
    Ok(row.as_ref().map(User::try_from).transpose()?)
}

/// Finds a user by their ID.
pub async fn find_by_id(pool: &Pool, user_id: i64) -> Result<Option<User>> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .await?;
    let row = client.query_opt(&stmt, &[&user_id]).await?;
    Ok(row.as_ref().map(User::try_from).transpose()?)
}

/// Updates a user's password hash.
pub async fn update_password(pool: &Pool, user_id: i64, password_hash: &str) -> Result<()> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached("UPDATE users SET password_hash = $1 WHERE id = $2")
        .await?;
    let updated = client.execute(&stmt, &[&password_hash, &user_id]).await?;
    if updated == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Updates a user's display name and returns the updated row.
pub async fn update_display_name(pool: &Pool, user_id: i64, display_name: &str) -> Result<User> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "UPDATE users SET display_name = $1 WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .await?;
    let row = client
        .query_opt(&stmt, &[&display_name, &user_id])
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(User::try_from(&row)?)
}

/// Deletes a user together with their sessions, decks and deck lines.
///
/// Everything happens in one transaction; a failure leaves the account intact.
pub async fn delete_user_cascade(pool: &Pool, user_id: i64) -> Result<()> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let lines = tx
        .execute(
            r#"
            DELETE FROM deck_cards
            WHERE deck_id IN (SELECT id FROM decks WHERE user_id = $1)
            "#,
            &[&user_id],
        )
        .await?;
    let decks = tx
        .execute("DELETE FROM decks WHERE user_id = $1", &[&user_id])
        .await?;
    let sessions = tx
        .execute("DELETE FROM sessions WHERE user_id = $1", &[&user_id])
        .await?;
    let users = tx
        .execute("DELETE FROM users WHERE id = $1", &[&user_id])
        .await?;

    if users == 0 {
        return Err(AppError::NotFound);
    }

    tx.commit().await?;

    tracing::debug!(
        user_id,
        lines,
        decks,
        sessions,
        "Removed account rows"
    );
    Ok(())
}
