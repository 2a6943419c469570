//! Shared helpers for integration tests.
//!
//! Tests that need PostgreSQL read its URL from `TEST_DATABASE_URL` and are
//! skipped when it is unset.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use deadpool_postgres::Pool;
use manatomb::config::Config;
use manatomb::error::{AppError, Result};
use manatomb::models::card::CatalogCard;
use manatomb::routes::build_router;
use manatomb::services::catalog::CatalogSource;
use manatomb::state::AppState;

/// Check if a test database is configured.
#[allow(dead_code)]
pub fn database_available() -> bool {
    std::env::var("TEST_DATABASE_URL").is_ok()
}

/// Skip test with message if no database is configured.
#[macro_export]
macro_rules! require_db {
    () => {
        if !crate::common::database_available() {
            eprintln!("⚠️  Skipping: TEST_DATABASE_URL not set");
            return;
        }
    };
}

/// Connects to the test database and applies the schema.
#[allow(dead_code)]
pub async fn test_pool() -> Pool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL not set");
    let pool = manatomb::db::create_pool(&url).expect("Failed to create pool");
    manatomb::db::run_migrations(&pool)
        .await
        .expect("Failed to apply schema");
    pool
}

/// A suffix unique to this process and moment, for isolating test rows.
#[allow(dead_code)]
pub fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}_{}", std::process::id(), nanos)
}

/// A fresh email address that no other test uses.
#[allow(dead_code)]
pub fn unique_email() -> String {
    format!("player_{}@example.com", unique_suffix())
}

/// Create a test app whose database and catalog are unreachable.
///
/// Good for every path that is rejected before any store access.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, AppState) {
    let config = Config::test_default();
    let state = AppState::new(&config).expect("Failed to build test state");
    (build_router(state.clone()), state)
}

/// Catalog fake answering exact-name queries from a fixed list.
/// Any other query returns the whole list.
///
/// Clones share the query log, so a test can keep one clone and hand the
/// other to a resolver.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct FakeCatalog {
    pub cards: Vec<CatalogCard>,
    pub unavailable: bool,
    pub queries: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl FakeCatalog {
    pub fn with(cards: Vec<CatalogCard>) -> Self {
        Self {
            cards,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

impl CatalogSource for FakeCatalog {
    async fn search(&self, query: &str) -> Result<Vec<CatalogCard>> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.unavailable {
            return Err(AppError::LookupUnavailable("connection refused".into()));
        }
        let wanted = query
            .strip_prefix("!\"")
            .and_then(|q| q.strip_suffix('"'))
            .map(str::to_lowercase);
        Ok(self
            .cards
            .iter()
            .filter(|c| wanted.as_deref().is_none_or(|w| matches_exact(&c.name, w)))
            .cloned()
            .collect())
    }
}

/// Exact-name matching as the catalog does it: case-insensitive, and a
/// double-faced card also answers to its front face.
fn matches_exact(card_name: &str, wanted: &str) -> bool {
    let card_name = card_name.to_lowercase();
    card_name == wanted
        || card_name
            .split_once(" // ")
            .is_some_and(|(front, _)| front == wanted)
}

/// A catalog card with the given name.
#[allow(dead_code)]
pub fn catalog_card(name: &str) -> CatalogCard {
    CatalogCard {
        name: name.to_string(),
        mana_cost: Some("{1}".into()),
        type_line: Some("Artifact".into()),
        oracle_text: Some("{T}: Add {C}{C}.".into()),
        image_uri: None,
    }
}
