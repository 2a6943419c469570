use crate::{
    error::{AppError, Result},
    models::card::{Card, CatalogCard},
    repositories::card::CardStore,
    services::catalog::{self, CatalogSource},
};

/// Resolves card names to local card records, consulting the external
/// catalog only for names the local store has never seen.
///
/// Also serves read-only catalog searches, which never touch the store.
#[derive(Clone)]
pub struct CardResolver<S, C> {
    store: S,
    catalog: C,
}

impl<S: CardStore, C: CatalogSource> CardResolver<S, C> {
    pub fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    /// Resolves a card by exact name.
    ///
    /// The local store is authoritative once it has a row: it is never
    /// refreshed from the catalog. Unknown names are looked up in the catalog
    /// with an exact-name query and the first match is stored. A name the
    /// catalog does not know yields `NotFound` and nothing is written.
    ///
    /// When the catalog answers under a different name (case, punctuation,
    /// the front face of a double-faced card), the requested name is kept as
    /// an alias so the next resolution of it stays local.
    pub async fn resolve(&self, name: &str) -> Result<Card> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::NotFound);
        }

        if let Some(card) = self.store.find_by_name(name).await? {
            tracing::debug!(card_id = card.id, "Card resolved locally");
            return Ok(card);
        }

        let found = self.catalog.search(&catalog::exact_name_query(name)).await?;
        let Some(first) = found.into_iter().next() else {
            tracing::debug!(name, "Card not found in catalog");
            return Err(AppError::NotFound);
        };

        if first.name == name {
            return self.store_catalog_card(&first).await;
        }

        // May already be stored under the canonical name.
        let card = match self.store.find_by_name(&first.name).await? {
            Some(card) => card,
            None => self.store_catalog_card(&first).await?,
        };
        self.store.add_alias(name, card.id).await?;
        tracing::debug!(card_id = card.id, alias = name, "Card alias recorded");
        Ok(card)
    }

    async fn store_catalog_card(&self, found: &CatalogCard) -> Result<Card> {
        match self.store.insert_if_absent(found).await? {
            Some(card) => {
                tracing::info!(card_id = card.id, name = %card.name, "✅ Card cached from catalog");
                Ok(card)
            }
            None => {
                // Lost an insert race with a concurrent resolution of the same name.
                self.store
                    .find_by_name(&found.name)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(format!("card {:?} vanished after conflict", found.name))
                    })
            }
        }
    }

    /// Free-form catalog search with optional colour-identity and type filters.
    ///
    /// Returns an empty list without calling the catalog when there is nothing
    /// to search for.
    pub async fn search(
        &self,
        query: &str,
        colors: &str,
        type_filter: &str,
    ) -> Result<Vec<CatalogCard>> {
        match catalog::build_search_query(query, colors, type_filter) {
            Some(search) => self.catalog.search(&search).await,
            None => Ok(Vec::new()),
        }
    }

    /// Searches for cards that can lead a commander deck.
    pub async fn search_commanders(&self, query: &str) -> Result<Vec<CatalogCard>> {
        match catalog::commander_query(query) {
            Some(search) => self.catalog.search(&search).await,
            None => Ok(Vec::new()),
        }
    }

    /// Best-effort lookup of a deck's commander for display.
    ///
    /// Catalog failures are logged and reported as `None`.
    pub async fn commander_details(&self, commander_name: &str) -> Option<CatalogCard> {
        match self.search_commanders(commander_name).await {
            Ok(results) => results.into_iter().next(),
            Err(e) => {
                tracing::warn!(error = %e, "Commander lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MemoryStore {
        cards: Mutex<HashMap<String, Card>>,
        aliases: Mutex<HashMap<String, i64>>,
        next_id: AtomicUsize,
        inserts: AtomicUsize,
    }

    impl MemoryStore {
        fn len(&self) -> usize {
            self.cards.lock().unwrap().len()
        }
    }

    impl CardStore for Arc<MemoryStore> {
        async fn find_by_name(&self, name: &str) -> Result<Option<Card>> {
            let cards = self.cards.lock().unwrap();
            if let Some(card) = cards.get(name) {
                return Ok(Some(card.clone()));
            }
            let alias = self.aliases.lock().unwrap().get(name).copied();
            Ok(alias.and_then(|id| cards.values().find(|c| c.id == id).cloned()))
        }

        async fn insert_if_absent(&self, card: &CatalogCard) -> Result<Option<Card>> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            let mut cards = self.cards.lock().unwrap();
            if cards.contains_key(&card.name) {
                return Ok(None);
            }
            let stored = Card {
                id: self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1,
                name: card.name.clone(),
                mana_cost: card.mana_cost.clone(),
                type_line: card.type_line.clone(),
                oracle_text: card.oracle_text.clone(),
                image_uri: card.image_uri.clone(),
            };
            cards.insert(card.name.clone(), stored.clone());
            Ok(Some(stored))
        }

        async fn add_alias(&self, alias: &str, card_id: i64) -> Result<()> {
            self.aliases
                .lock()
                .unwrap()
                .entry(alias.to_string())
                .or_insert(card_id);
            Ok(())
        }
    }

    /// Catalog fake answering exact-name queries from a fixed list.
    #[derive(Default)]
    struct FakeCatalog {
        cards: Vec<CatalogCard>,
        unavailable: bool,
        queries: Mutex<Vec<String>>,
    }

    impl FakeCatalog {
        fn with(names: &[&str]) -> Self {
            Self {
                cards: names.iter().map(|n| catalog_card(n)).collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.queries.lock().unwrap().len()
        }
    }

    impl CatalogSource for Arc<FakeCatalog> {
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

    fn catalog_card(name: &str) -> CatalogCard {
        CatalogCard {
            name: name.to_string(),
            mana_cost: Some("{1}".into()),
            type_line: Some("Artifact".into()),
            oracle_text: None,
            image_uri: None,
        }
    }

    fn resolver(
        catalog: FakeCatalog,
    ) -> (
        CardResolver<Arc<MemoryStore>, Arc<FakeCatalog>>,
        Arc<MemoryStore>,
        Arc<FakeCatalog>,
    ) {
        let store = Arc::new(MemoryStore::default());
        let catalog = Arc::new(catalog);
        (
            CardResolver::new(store.clone(), catalog.clone()),
            store,
            catalog,
        )
    }

    #[tokio::test]
    async fn resolve_is_idempotent_and_fetches_once() {
        let (resolver, store, catalog) = resolver(FakeCatalog::with(&["Sol Ring"]));

        let first = resolver.resolve("Sol Ring").await.unwrap();
        let second = resolver.resolve("  Sol Ring ").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(catalog.calls(), 1);
        assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
        assert_eq!(
            catalog.queries.lock().unwrap().as_slice(),
            [r#"!"Sol Ring""#.to_string()]
        );
    }

    #[tokio::test]
    async fn empty_name_is_not_found_without_lookup() {
        let (resolver, _, catalog) = resolver(FakeCatalog::with(&["Sol Ring"]));
        assert!(matches!(resolver.resolve("   ").await, Err(AppError::NotFound)));
        assert_eq!(catalog.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_names_are_not_cached() {
        let (resolver, store, catalog) = resolver(FakeCatalog::with(&["Sol Ring"]));

        for _ in 0..2 {
            assert!(matches!(
                resolver.resolve("Nonexistent Card XYZ").await,
                Err(AppError::NotFound)
            ));
        }

        assert_eq!(catalog.calls(), 2);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn catalog_failure_is_distinct_from_not_found() {
        let (resolver, store, _) = resolver(FakeCatalog {
            unavailable: true,
            ..FakeCatalog::with(&["Sol Ring"])
        });

        assert!(matches!(
            resolver.resolve("Sol Ring").await,
            Err(AppError::LookupUnavailable(_))
        ));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn local_rows_are_never_refreshed() {
        let (resolver, store, catalog) = resolver(FakeCatalog {
            unavailable: true,
            ..Default::default()
        });
        store
            .insert_if_absent(&catalog_card("Arcane Signet"))
            .await
            .unwrap();

        let card = resolver.resolve("Arcane Signet").await.unwrap();
        assert_eq!(card.name, "Arcane Signet");
        assert_eq!(catalog.calls(), 0);
    }

    #[tokio::test]
    async fn canonical_name_converges_on_one_row() {
        let (resolver, store, _) = resolver(FakeCatalog::with(&["Sol Ring"]));

        let canonical = resolver.resolve("Sol Ring").await.unwrap();
        let lowercase = resolver.resolve("sol ring").await.unwrap();

        assert_eq!(canonical.id, lowercase.id);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn non_canonical_name_fetches_once() {
        let (resolver, store, catalog) = resolver(FakeCatalog::with(&["Sol Ring"]));

        let first = resolver.resolve("sol ring").await.unwrap();
        for _ in 0..2 {
            assert_eq!(resolver.resolve("sol ring").await.unwrap().id, first.id);
        }

        assert_eq!(first.name, "Sol Ring");
        assert_eq!(catalog.calls(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(resolver.resolve("Sol Ring").await.unwrap().id, first.id);
        assert_eq!(catalog.calls(), 1);
    }

    #[tokio::test]
    async fn front_face_name_fetches_once() {
        let full = "Delver of Secrets // Insectile Aberration";
        let (resolver, store, catalog) = resolver(FakeCatalog::with(&[full]));

        let first = resolver.resolve("Delver of Secrets").await.unwrap();
        let second = resolver.resolve("Delver of Secrets").await.unwrap();

        assert_eq!(first.name, full);
        assert_eq!(first.id, second.id);
        assert_eq!(catalog.calls(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_first_resolutions_share_a_row() {
        let (resolver, store, _) = resolver(FakeCatalog::with(&["Mana Crypt"]));

        let (a, b) = tokio::join!(resolver.resolve("Mana Crypt"), resolver.resolve("Mana Crypt"));
        assert_eq!(a.unwrap().id, b.unwrap().id);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn search_never_writes() {
        let (resolver, store, catalog) =
            resolver(FakeCatalog::with(&["Llanowar Elves", "Elvish Mystic"]));

        let results = resolver.search("elf", "g", "creature").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(store.len(), 0);
        assert_eq!(
            catalog.queries.lock().unwrap().as_slice(),
            ["elf id>=G t:creature".to_string()]
        );
    }

    #[tokio::test]
    async fn empty_search_skips_catalog() {
        let (resolver, _, catalog) = resolver(FakeCatalog::with(&["Sol Ring"]));
        assert!(resolver.search("", "", "").await.unwrap().is_empty());
        assert!(resolver.search_commanders(" ").await.unwrap().is_empty());
        assert_eq!(catalog.calls(), 0);
    }

    #[tokio::test]
    async fn commander_details_swallow_failures() {
        let (resolver, _, _) = resolver(FakeCatalog {
            unavailable: true,
            ..Default::default()
        });
        assert_eq!(resolver.commander_details("Atraxa").await, None);
    }
}
