use serde::Serialize;
use tokio_postgres::Row;

/// A card stored in the local catalog cache.
///
/// Rows are written once, on first resolution, and never refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: i64,
    pub name: String,
    pub mana_cost: Option<String>,
    pub type_line: Option<String>,
    pub oracle_text: Option<String>,
    pub image_uri: Option<String>,
}

impl TryFrom<&Row> for Card {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            mana_cost: row.try_get("mana_cost")?,
            type_line: row.try_get("type_line")?,
            oracle_text: row.try_get("oracle_text")?,
            image_uri: row.try_get("image_uri")?,
        })
    }
}

/// A card as returned by the external catalog. Not persisted unless resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogCard {
    pub name: String,
    pub mana_cost: Option<String>,
    pub type_line: Option<String>,
    pub oracle_text: Option<String>,
    pub image_uri: Option<String>,
}
