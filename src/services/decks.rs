use deadpool_postgres::Pool;

use crate::{
    error::{is_foreign_key_violation, AppError, Result},
    models::{
        card::Card,
        deck::{Deck, DeckFields, DeckLine},
        user::CurrentUser,
    },
    repositories::{card::CardStore, deck as deck_repo},
    services::{cards::CardResolver, catalog::CatalogSource},
};

/// What a delta does to a stored line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    /// Remove the row. Removing an absent row is a no-op.
    Remove,
    /// Insert a new row with this quantity.
    Insert(i32),
    /// Overwrite the existing row's quantity.
    Update(i32),
}

/// Decides how to apply `delta` to a line whose current quantity is `current`
/// (`None` when no row exists).
///
/// A result of zero or less removes the line; quantities are never stored
/// below one.
pub fn plan_delta(current: Option<i32>, delta: i32) -> Result<LineChange> {
    let new_qty = current
        .unwrap_or(0)
        .checked_add(delta)
        .ok_or_else(|| AppError::Validation("Card quantity out of range.".to_string()))?;

    Ok(match (current, new_qty) {
        (_, q) if q <= 0 => LineChange::Remove,
        (None, q) => LineChange::Insert(q),
        (Some(_), q) => LineChange::Update(q),
    })
}

/// Creates a deck owned by the caller.
pub async fn create_deck(db: &Pool, caller: &CurrentUser, fields: &DeckFields) -> Result<Deck> {
    let deck = deck_repo::create_deck(db, caller.id, fields).await?;
    tracing::info!(deck_id = deck.id, user_id = caller.id, "✅ Deck created");
    Ok(deck)
}

/// Lists the caller's decks, most recently updated first.
pub async fn list_decks(db: &Pool, caller: &CurrentUser, limit: Option<i64>) -> Result<Vec<Deck>> {
    deck_repo::list_by_user(db, caller.id, limit).await
}

/// Loads a deck owned by the caller.
///
/// Another user's deck is reported as `NotFound`, same as a missing one.
pub async fn get_deck(db: &Pool, caller: &CurrentUser, deck_id: i64) -> Result<Deck> {
    deck_repo::find_owned(db, deck_id, caller.id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Updates a deck owned by the caller.
pub async fn update_deck(
    db: &Pool,
    caller: &CurrentUser,
    deck_id: i64,
    fields: &DeckFields,
) -> Result<Deck> {
    let deck = deck_repo::update_owned(db, deck_id, caller.id, fields)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(deck_id, user_id = caller.id, "✅ Deck updated");
    Ok(deck)
}

/// Deletes a deck owned by the caller together with its lines.
pub async fn delete_deck(db: &Pool, caller: &CurrentUser, deck_id: i64) -> Result<()> {
    if !deck_repo::delete_owned(db, deck_id, caller.id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(deck_id, user_id = caller.id, "🗑️ Deck deleted");
    Ok(())
}

/// Lists a deck's lines ordered by card name.
pub async fn list_lines(db: &Pool, caller: &CurrentUser, deck_id: i64) -> Result<Vec<DeckLine>> {
    get_deck(db, caller, deck_id).await?;
    deck_repo::list_lines(db, deck_id).await
}

/// Applies a signed quantity change to one card of a deck.
///
/// An unknown card is `NotFound`, same as a missing deck.
///
/// Runs in a single transaction. The deck row is locked first (which also
/// checks ownership), so concurrent deltas on the same deck serialize and the
/// read-modify-write of the line cannot lose an update. Any failure rolls
/// the whole change back.
pub async fn apply_delta(
    db: &Pool,
    caller: &CurrentUser,
    deck_id: i64,
    card_id: i64,
    delta: i32,
) -> Result<LineChange> {
    let mut client = db.get().await?;
    let tx = client.transaction().await?;

    let lock = tx
        .prepare_cached(
            r#"
            UPDATE decks SET updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id
            "#,
        )
        .await?;
    if tx.query_opt(&lock, &[&deck_id, &caller.id]).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let select = tx
        .prepare_cached("SELECT quantity FROM deck_cards WHERE deck_id = $1 AND card_id = $2")
        .await?;
    let current: Option<i32> = tx
        .query_opt(&select, &[&deck_id, &card_id])
        .await?
        .map(|row| row.try_get("quantity"))
        .transpose()?;

    let change = plan_delta(current, delta)?;
    match change {
        LineChange::Remove => {
            let stmt = tx
                .prepare_cached("DELETE FROM deck_cards WHERE deck_id = $1 AND card_id = $2")
                .await?;
            tx.execute(&stmt, &[&deck_id, &card_id]).await?;
        }
        LineChange::Insert(quantity) => {
            let stmt = tx
                .prepare_cached(
                    "INSERT INTO deck_cards (deck_id, card_id, quantity) VALUES ($1, $2, $3)",
                )
                .await?;
            tx.execute(&stmt, &[&deck_id, &card_id, &quantity])
                .await
                .map_err(|e| {
                    if is_foreign_key_violation(&e, "deck_cards_card_id_fkey") {
                        AppError::NotFound
                    } else {
                        AppError::Database(e)
                    }
                })?;
        }
        LineChange::Update(quantity) => {
            let stmt = tx
                .prepare_cached(
                    "UPDATE deck_cards SET quantity = $3 WHERE deck_id = $1 AND card_id = $2",
                )
                .await?;
            tx.execute(&stmt, &[&deck_id, &card_id, &quantity]).await?;
        }
    }

    tx.commit().await?;

    tracing::debug!(deck_id, card_id, delta, ?change, "Deck line updated");
    Ok(change)
}

/// Adds one copy of a card, resolved by name, to a deck owned by the caller.
///
/// Ownership is checked before the name is resolved, so a foreign deck
/// never triggers a catalog lookup.
pub async fn add_card_by_name<S: CardStore, C: CatalogSource>(
    db: &Pool,
    resolver: &CardResolver<S, C>,
    caller: &CurrentUser,
    deck_id: i64,
    card_name: &str,
) -> Result<Card> {
    get_deck(db, caller, deck_id).await?;

    let card = resolver.resolve(card_name).await.map_err(|e| match e {
        AppError::NotFound => AppError::Validation(format!(
            "No card found named \u{201c}{}\u{201d}. Please check the spelling.",
            card_name.trim()
        )),
        other => other,
    })?;

    apply_delta(db, caller, deck_id, card.id, 1).await?;
    Ok(card)
}
