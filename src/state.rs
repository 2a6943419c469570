use deadpool_postgres::Pool;
use std::sync::Arc;
use crate::config::Config;
use crate::error::Result;
use crate::repositories::card::PgCardStore;
use crate::services::cards::CardResolver;
use crate::services::catalog::ScryfallClient;

/// The resolver wired to PostgreSQL and the HTTP catalog.
pub type AppCardResolver = CardResolver<PgCardStore, ScryfallClient>;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The application's configuration.
    pub config: Config,
    /// Card name resolution and catalog search.
    pub cards: Arc<AppCardResolver>,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// The pool connects lazily, so this does not touch the database.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized");

        let catalog = ScryfallClient::new(&config.catalog_base_url, config.catalog_timeout)?;
        tracing::info!(
            "✅ Card catalog client initialized ({}, timeout {:?})",
            config.catalog_base_url,
            config.catalog_timeout
        );

        let cards = Arc::new(CardResolver::new(PgCardStore::new(db.clone()), catalog));

        Ok(AppState {
            db,
            config: config.clone(),
            cards,
        })
    }
}
