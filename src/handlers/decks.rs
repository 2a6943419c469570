use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    models::{
        card::{Card, CatalogCard},
        deck::{Deck, DeckFields, DeckLine},
        user::CurrentUser,
    },
    services::decks as deck_service,
    state::AppState,
    validation::deck::validate_deck_fields,
};

const MAX_LIST_LIMIT: i64 = 100;

/// The request payload for creating or editing a deck.
#[derive(Deserialize)]
pub struct DeckRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub commander_name: Option<String>,
}

/// The query parameters for listing decks.
#[derive(Deserialize)]
pub struct ListDecksQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

/// The request payload for adding a card by name.
#[derive(Deserialize)]
pub struct AddCardRequest {
    pub card_name: String,
}

/// A deck with its card lines and, when available, its commander's details.
#[derive(Serialize)]
pub struct DeckView {
    pub deck: Deck,
    pub lines: Vec<DeckLine>,
    pub commander: Option<CatalogCard>,
}

/// A bare confirmation message.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// The response after changing a deck's card list.
#[derive(Serialize)]
pub struct LinesResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<Card>,
    pub lines: Vec<DeckLine>,
}

impl DeckRequest {
    fn fields(&self) -> Result<DeckFields> {
        validate_deck_fields(
            &self.name,
            self.description.as_deref(),
            self.format.as_deref(),
            self.commander_name.as_deref(),
        )
    }
}

/// Lists the caller's decks.
#[axum::debug_handler]
pub async fn list_decks(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Query(query): Query<ListDecksQuery>,
) -> Result<Json<Vec<Deck>>> {
    let limit = query.limit.map(|l| l.clamp(1, MAX_LIST_LIMIT));
    let decks = deck_service::list_decks(&state.db, &caller, limit).await?;
    Ok(Json(decks))
}

/// Creates a new deck.
#[axum::debug_handler]
pub async fn create_deck(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Json(req): Json<DeckRequest>,
) -> Result<Response> {
    let fields = req.fields()?;
    let deck = deck_service::create_deck(&state.db, &caller, &fields).await?;
    Ok((StatusCode::CREATED, Json(deck)).into_response())
}

/// Shows a deck, its lines and its commander.
#[axum::debug_handler]
pub async fn show_deck(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Path(deck_id): Path<i64>,
) -> Result<Json<DeckView>> {
    let deck = deck_service::get_deck(&state.db, &caller, deck_id).await?;
    let lines = deck_service::list_lines(&state.db, &caller, deck_id).await?;

    let commander = match deck.commander_name.as_deref() {
        Some(name) => state.cards.commander_details(name).await,
        None => None,
    };

    Ok(Json(DeckView {
        deck,
        lines,
        commander,
    }))
}

/// Edits a deck.
#[axum::debug_handler]
pub async fn update_deck(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Path(deck_id): Path<i64>,
    Json(req): Json<DeckRequest>,
) -> Result<Json<Deck>> {
    let fields = req.fields()?;
    let deck = deck_service::update_deck(&state.db, &caller, deck_id, &fields).await?;
    Ok(Json(deck))
}

/// Deletes a deck.
#[axum::debug_handler]
pub async fn delete_deck(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Path(deck_id): Path<i64>,
) -> Result<Response> {
    deck_service::delete_deck(&state.db, &caller, deck_id).await?;
    let response = MessageResponse {
        message: "Deck deleted.".to_string(),
    };
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Adds one copy of a card, by name, to a deck.
#[axum::debug_handler]
pub async fn add_card(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Path(deck_id): Path<i64>,
    Json(req): Json<AddCardRequest>,
) -> Result<Json<LinesResponse>> {
    let card = deck_service::add_card_by_name(
        &state.db,
        state.cards.as_ref(),
        &caller,
        deck_id,
        &req.card_name,
    )
    .await?;
    let lines = deck_service::list_lines(&state.db, &caller, deck_id).await?;

    Ok(Json(LinesResponse {
        card: Some(card),
        lines,
    }))
}

/// Removes one copy of a card from a deck. The line disappears at zero.
#[axum::debug_handler]
pub async fn decrement_card(
    State(state): State<AppState>,
    Extension(caller): Extension<CurrentUser>,
    Path((deck_id, card_id)): Path<(i64, i64)>,
) -> Result<Json<LinesResponse>> {
    deck_service::apply_delta(&state.db, &caller, deck_id, card_id, -1).await?;
    let lines = deck_service::list_lines(&state.db, &caller, deck_id).await?;

    Ok(Json(LinesResponse { card: None, lines }))
}
