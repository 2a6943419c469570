use deadpool_postgres::Pool;
use crate::{
    error::Result,
    models::deck::{Deck, DeckFields, DeckLine},
};

const DECK_COLUMNS: &str =
    "id, user_id, name, description, format, commander_name, created_at, updated_at";

/// Creates a new deck in the database.
pub async fn create_deck(pool: &Pool, user_id: i64, fields: &DeckFields) -> Result<Deck> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            r#"
            INSERT INTO decks (user_id, name, description, format, commander_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {DECK_COLUMNS}
            "#
        ))
        .await?;
    let row = client
        .query_one(
            &stmt,
            &[
                &user_id,
                &fields.name,
                &fields.description,
                &fields.format,
                &fields.commander_name,
            ],
        )
        .await?;
    Ok(Deck::try_from(&row)?)
}

/// Lists a user's decks, most recently updated first.
///
/// `limit` of `None` returns every deck.
pub async fn list_by_user(pool: &Pool, user_id: i64, limit: Option<i64>) -> Result<Vec<Deck>> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            r#"
            SELECT {DECK_COLUMNS}
            FROM decks
            WHERE user_id = $1
            ORDER BY updated_at DESC, id DESC
            LIMIT $2
            "#
        ))
        .await?;
    let rows = client.query(&stmt, &[&user_id, &limit]).await?;
    rows.iter()
        .map(|row| Deck::try_from(row).map_err(Into::into))
        .collect()
}

/// Finds a deck by ID, but only if `user_id` owns it.
pub async fn find_owned(pool: &Pool, deck_id: i64, user_id: i64) -> Result<Option<Deck>> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "SELECT {DECK_COLUMNS} FROM decks WHERE id = $1 AND user_id = $2"
        ))
        .await?;
    let row = client.query_opt(&stmt, &[&deck_id, &user_id]).await?;
    Ok(row.as_ref().map(Deck::try_from).transpose()?)
}

/// Updates an owned deck. Returns `None` if the deck is absent or not owned.
pub async fn update_owned(
    pool: &Pool,
    deck_id: i64,
    user_id: i64,
    fields: &DeckFields,
) -> Result<Option<Deck>> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            r#"
            UPDATE decks
            SET name = $3,
                description = $4,
                format = $5,
                commander_name = $6,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {DECK_COLUMNS}
            "#
        ))
        .await?;
    let row = client
        .query_opt(
            &stmt,
            &[
                &deck_id,
                &user_id,
                &fields.name,
                &fields.description,
                &fields.format,
                &fields.commander_name,
            ],
        )
        .await?;
    Ok(row.as_ref().map(Deck::try_from).transpose()?)
}

/// Deletes an owned deck; its lines go with it through the foreign key.
///
/// Returns `false` if nothing was deleted.
pub async fn delete_owned(pool: &Pool, deck_id: i64, user_id: i64) -> Result<bool> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached("DELETE FROM decks WHERE id = $1 AND user_id = $2")
        .await?;
    let deleted = client.execute(&stmt, &[&deck_id, &user_id]).await?;
    Ok(deleted > 0)
}

/// Lists the card lines of a deck, ordered by card name.
pub async fn list_lines(pool: &Pool, deck_id: i64) -> Result<Vec<DeckLine>> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            r#"
            SELECT dc.card_id, c.name AS card_name, dc.quantity
            FROM deck_cards dc
            JOIN cards c ON c.id = dc.card_id
            WHERE dc.deck_id = $1
            ORDER BY c.name ASC, dc.card_id ASC
            "#,
        )
        .await?;
    let rows = client.query(&stmt, &[&deck_id]).await?;
    rows.iter()
        .map(|row| DeckLine::try_from(row).map_err(Into::into))
        .collect()
}
