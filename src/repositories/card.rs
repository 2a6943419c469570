use std::future::Future;

use deadpool_postgres::Pool;
use crate::{
    error::Result,
    models::card::{Card, CatalogCard},
};

const CARD_COLUMNS: &str = "id, name, mana_cost, type_line, oracle_text, image_uri";
const ALIASED_CARD_COLUMNS: &str =
    "c.id, c.name, c.mana_cost, c.type_line, c.oracle_text, c.image_uri";

/// Local card storage used by the resolver.
pub trait CardStore: Send + Sync {
    /// Looks a card up by its exact name or by a recorded alias.
    fn find_by_name(&self, name: &str) -> impl Future<Output = Result<Option<Card>>> + Send;

    /// Inserts a card unless one with the same name exists.
    ///
    /// Returns `None` when another writer got there first.
    fn insert_if_absent(
        &self,
        card: &CatalogCard,
    ) -> impl Future<Output = Result<Option<Card>>> + Send;

    /// Records `alias` as another name for `card_id`. An existing alias is kept.
    fn add_alias(&self, alias: &str, card_id: i64) -> impl Future<Output = Result<()>> + Send;
}

/// PostgreSQL-backed card store.
#[derive(Clone)]
pub struct PgCardStore {
    pool: Pool,
}

impl PgCardStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

impl CardStore for PgCardStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Card>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!(
                r#"
                SELECT {CARD_COLUMNS}, 0 AS rank FROM cards WHERE name = $1
                UNION ALL
                SELECT {ALIASED_CARD_COLUMNS}, 1 AS rank
                FROM card_aliases a
                JOIN cards c ON c.id = a.card_id
                WHERE a.alias = $1
                ORDER BY rank
                LIMIT 1
                "#
            ))
            .await?;
        let row = client.query_opt(&stmt, &[&name]).await?;
        Ok(row.as_ref().map(Card::try_from).transpose()?)
    }

    async fn insert_if_absent(&self, card: &CatalogCard) -> Result<Option<Card>> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(&format!(
                r#"
                INSERT INTO cards (name, mana_cost, type_line, oracle_text, image_uri)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (name) DO NOTHING
                RETURNING {CARD_COLUMNS}
                "#
            ))
            .await?;
        let row = client
            .query_opt(
                &stmt,
                &[
                    &card.name,
                    &card.mana_cost,
                    &card.type_line,
                    &card.oracle_text,
                    &card.image_uri,
                ],
            )
            .await?;
        Ok(row.as_ref().map(Card::try_from).transpose()?)
    }

    async fn add_alias(&self, alias: &str, card_id: i64) -> Result<()> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare_cached(
                r#"
                INSERT INTO card_aliases (alias, card_id)
                VALUES ($1, $2)
                ON CONFLICT (alias) DO NOTHING
                "#,
            )
            .await?;
        client.execute(&stmt, &[&alias, &card_id]).await?;
        Ok(())
    }
}
