use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use http::{Method, header};
use std::any::Any;
use std::time::Duration;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    error::AppError,
    handlers,
    middleware_layer::{self, csrf::CSRF_HEADER},
    state::AppState,
};

/// Largest request body accepted. Every payload here is a small JSON object.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Turns a panicking handler into a generic 500 instead of a dropped connection.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    AppError::Internal(format!("handler panicked: {}", detail)).into_response()
}

/// Builds the application's router.
///
/// Every request passes through session resolution. Routes under the
/// protected group additionally require a session and, for state-changing
/// methods, a matching CSRF token.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.allowed_origin.clone())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::COOKIE,
            header::HeaderName::from_static(CSRF_HEADER),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    let public_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/cards/search", get(handlers::cards::search_cards))
        .route(
            "/api/commanders/search",
            get(handlers::cards::search_commanders),
        )
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route(
            "/api/account",
            get(handlers::account::show).delete(handlers::account::delete_account),
        )
        .route(
            "/api/account/profile",
            post(handlers::account::update_profile),
        )
        .route(
            "/api/account/password",
            post(handlers::account::change_password),
        )
        .route(
            "/api/decks",
            get(handlers::decks::list_decks).post(handlers::decks::create_deck),
        )
        .route(
            "/api/decks/{deck_id}",
            get(handlers::decks::show_deck)
                .put(handlers::decks::update_deck)
                .delete(handlers::decks::delete_deck),
        )
        .route("/api/decks/{deck_id}/cards", post(handlers::decks::add_card))
        .route(
            "/api/decks/{deck_id}/cards/{card_id}/decrement",
            post(handlers::decks::decrement_card),
        )
        .route_layer(axum::middleware::from_fn(
            middleware_layer::csrf::verify_csrf,
        ))
        .route_layer(axum::middleware::from_fn(
            middleware_layer::auth::require_auth,
        ))
        .with_state(state.clone());

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(|| async { AppError::NotFound })
        .layer(from_fn_with_state(
            state.clone(),
            middleware_layer::auth::resolve_user,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(CatchPanicLayer::custom(handle_panic))
}
