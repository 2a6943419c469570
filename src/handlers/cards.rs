use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{error::Result, models::card::CatalogCard, state::AppState};

/// The query parameters for a card search.
#[derive(Deserialize, Default)]
pub struct CardSearchQuery {
    #[serde(default)]
    pub q: String,
    /// Colour identity letters, e.g. `WU`.
    #[serde(default)]
    pub colors: String,
    #[serde(default, rename = "type")]
    pub type_filter: String,
}

/// The query parameters for a commander search.
#[derive(Deserialize, Default)]
pub struct CommanderSearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Search results, in catalog order.
#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub has_searched: bool,
    pub results: Vec<CatalogCard>,
}

/// Searches the catalog. Nothing is stored.
#[axum::debug_handler]
pub async fn search_cards(
    State(state): State<AppState>,
    Query(params): Query<CardSearchQuery>,
) -> Result<Json<SearchResponse>> {
    let has_searched = !params.q.trim().is_empty()
        || !params.colors.trim().is_empty()
        || !params.type_filter.trim().is_empty();

    let results = state
        .cards
        .search(&params.q, &params.colors, &params.type_filter)
        .await?;

    Ok(Json(SearchResponse {
        query: params.q.trim().to_string(),
        has_searched,
        results,
    }))
}

/// Searches the catalog for cards that can be a commander.
#[axum::debug_handler]
pub async fn search_commanders(
    State(state): State<AppState>,
    Query(params): Query<CommanderSearchQuery>,
) -> Result<Json<SearchResponse>> {
    let results = state.cards.search_commanders(&params.q).await?;

    Ok(Json(SearchResponse {
        query: params.q.trim().to_string(),
        has_searched: !params.q.trim().is_empty(),
        results,
    }))
}
