use deadpool_postgres::Pool;
use crate::{
    error::Result,
    models::{session::Session, user::User},
};

/// Stores a session under the digest of its token.
pub async fn insert_session(pool: &Pool, token_hash: &str, session: &Session) -> Result<()> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            r#"
            INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .await?;
    client
        .execute(
            &stmt,
            &[
                &token_hash,
                &session.user_id,
                &session.created_at,
                &session.expires_at,
            ],
        )
        .await?;
    Ok(())
}

/// Loads a session and its user. Expiry is checked by the caller.
pub async fn find_with_user(pool: &Pool, token_hash: &str) -> Result<Option<(Session, User)>> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            r#"
            SELECT s.user_id, s.created_at AS session_created_at, s.expires_at,
                   u.id, u.email, u.display_name, u.password_hash, u.created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1
            "#,
        )
        .await?;

    let Some(row) = client.query_opt(&stmt, &[&token_hash]).await? else {
        return Ok(None);
    };

    let session = Session {
        user_id: row.try_get("user_id")?,
        created_at: row.try_get("session_created_at")?,
        expires_at: row.try_get("expires_at")?,
    };
    let user = User::try_from(&row)?;
    Ok(Some((session, user)))
}

/// Removes a session. Removing an unknown session is not an error.
pub async fn delete_session(pool: &Pool, token_hash: &str) -> Result<()> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached("DELETE FROM sessions WHERE token_hash = $1")
        .await?;
    client.execute(&stmt, &[&token_hash]).await?;
    Ok(())
}
