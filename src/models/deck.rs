use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_postgres::Row;

/// Format tag given to decks created without one.
pub const DEFAULT_FORMAT: &str = "commander";

/// Represents a deck owned by a single user.
#[derive(Debug, Clone, Serialize)]
pub struct Deck {
    /// The unique identifier for the deck.
    pub id: i64,
    /// The ID of the user who owns the deck.
    pub user_id: i64,
    /// The name of the deck.
    pub name: String,
    /// Free-text description. Empty when not given.
    pub description: String,
    /// Format tag, e.g. `commander`.
    pub format: String,
    /// Name of the commander card, if any.
    pub commander_name: Option<String>,
    /// The timestamp when the deck was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the deck or its card list last changed.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Row> for Deck {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            format: row.try_get("format")?,
            commander_name: row.try_get("commander_name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Validated deck fields used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckFields {
    pub name: String,
    pub description: String,
    pub format: String,
    pub commander_name: Option<String>,
}

/// One card line of a deck. Existence implies `quantity >= 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckLine {
    pub card_id: i64,
    pub card_name: String,
    pub quantity: i32,
}

impl TryFrom<&Row> for DeckLine {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Self {
            card_id: row.try_get("card_id")?,
            card_name: row.try_get("card_name")?,
            quantity: row.try_get("quantity")?,
        })
    }
}
