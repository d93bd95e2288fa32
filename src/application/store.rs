//! Canonical quote collection and its persistence

use crate::domain::{default_drafts, text_key, Quote, QuoteDraft};
use crate::error::{Result, ValidationError};
use crate::infrastructure::storage::{write_json, QUOTES_KEY};
use crate::infrastructure::KeyValueStorage;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};

/// Stored record shape; older documents may lack everything but text and category
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredQuote {
    text: String,
    category: String,
    id: Option<i64>,
    date_added: Option<DateTime<Utc>>,
    favorite: Option<bool>,
}

/// Owns the ordered quote collection. All mutation goes through here.
pub struct QuoteStore {
    storage: Box<dyn KeyValueStorage>,
    quotes: Vec<Quote>,
    last_id: i64,
    degraded: bool,
}

impl QuoteStore {
    /// Load the persisted collection, seeding defaults when it is absent or unparseable
    pub fn load(storage: Box<dyn KeyValueStorage>) -> Self {
        let mut store = QuoteStore {
            storage,
            quotes: Vec::new(),
            last_id: 0,
            degraded: false,
        };
        store.reload();
        store
    }

    /// Re-read the collection from storage, replacing the in-memory copy
    pub fn reload(&mut self) {
        match self.read_persisted() {
            Some(records) => {
                self.quotes.clear();
                self.restore(records);
                tracing::debug!(count = self.quotes.len(), "loaded quotes");
            }
            None if self.degraded => {
                tracing::debug!("storage unavailable, keeping in-memory quotes");
            }
            None => {
                tracing::info!("no stored quotes, seeding defaults");
                self.quotes.clear();
                for draft in default_drafts() {
                    if let Ok(draft) = draft.normalize() {
                        let quote = self.mint(draft);
                        self.quotes.push(quote);
                    }
                }
                self.save();
            }
        }
    }

    fn read_persisted(&self) -> Option<Vec<serde_json::Value>> {
        let raw = match self.storage.get(QUOTES_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stored quotes");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Some(records),
            Err(e) => {
                tracing::warn!(error = %e, "stored quotes are unparseable");
                None
            }
        }
    }

    /// Normalize stored records, filling defaults for fields older shapes lack
    fn restore(&mut self, records: Vec<serde_json::Value>) {
        let mut seen_ids = HashSet::new();
        let mut seen_texts = HashSet::new();

        for value in records {
            let Ok(stored) = serde_json::from_value::<StoredQuote>(value) else {
                tracing::warn!("dropping stored quote with unexpected shape");
                continue;
            };

            let draft = match QuoteDraft::new(stored.text, stored.category)
                .with_favorite(stored.favorite.unwrap_or(false))
                .normalize()
            {
                Ok(draft) => draft,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping invalid stored quote");
                    continue;
                }
            };

            if !seen_texts.insert(text_key(&draft.text)) {
                tracing::warn!(text = %draft.text, "dropping duplicate stored quote");
                continue;
            }

            if let Some(id) = stored.id {
                self.last_id = self.last_id.max(id);
            }
            let id = match stored.id {
                Some(id) if seen_ids.insert(id) => id,
                _ => 0,
            };

            let date_added = stored.date_added.unwrap_or_else(Utc::now);
            self.quotes.push(draft.into_quote(id, date_added));
        }

        // Fresh ids only after every stored id is known
        for index in 0..self.quotes.len() {
            if self.quotes[index].id == 0 {
                let id = self.next_id();
                self.quotes[index].id = id;
            }
        }
    }

    /// Persist the collection. Failures are logged and leave the store memory-only.
    pub fn save(&mut self) {
        match write_json(self.storage.as_ref(), QUOTES_KEY, &self.quotes) {
            Ok(()) => {
                if self.degraded {
                    tracing::info!("storage available again");
                }
                self.degraded = false;
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not persist quotes, continuing in memory");
                self.degraded = true;
            }
        }
    }

    /// Time-based id, strictly greater than any id handed out before
    fn next_id(&mut self) -> i64 {
        let id = Utc::now().timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        id
    }

    /// Give a normalized draft an id and creation date without storing it.
    ///
    /// A date carried by the draft is kept; otherwise the quote is dated now.
    pub fn mint(&mut self, draft: QuoteDraft) -> Quote {
        let id = self.next_id();
        let date_added = draft.date_added.unwrap_or_else(Utc::now);
        draft.into_quote(id, date_added)
    }

    fn check_insertable(
        &self,
        draft: QuoteDraft,
    ) -> std::result::Result<QuoteDraft, ValidationError> {
        let draft = draft.normalize()?;
        if self.contains_text(&draft.text) {
            return Err(ValidationError::Duplicate(draft.text));
        }
        Ok(draft)
    }

    /// Validate, append and persist a new quote
    pub fn add(&mut self, draft: QuoteDraft) -> Result<Quote> {
        let draft = self.check_insertable(draft)?;
        let quote = self.mint(draft);
        self.quotes.push(quote.clone());
        self.save();

        tracing::info!(id = quote.id, category = %quote.category, "added quote");
        Ok(quote)
    }

    /// Append several drafts, persisting once. Each entry reports its own outcome.
    pub fn extend(
        &mut self,
        drafts: Vec<QuoteDraft>,
    ) -> Vec<std::result::Result<Quote, ValidationError>> {
        let outcomes: Vec<_> = drafts
            .into_iter()
            .map(|draft| -> std::result::Result<Quote, ValidationError> {
                let draft = self.check_insertable(draft)?;
                let quote = self.mint(draft);
                self.quotes.push(quote.clone());
                Ok(quote)
            })
            .collect();

        if outcomes.iter().any(|o| o.is_ok()) {
            self.save();
        }
        outcomes
    }

    /// Flip the favorite flag. Returns the new state, or `None` for an unknown id.
    pub fn toggle_favorite(&mut self, id: i64) -> Option<bool> {
        let quote = self.quotes.iter_mut().find(|q| q.id == id)?;
        quote.favorite = !quote.favorite;
        let favorite = quote.favorite;
        self.save();
        Some(favorite)
    }

    /// Substitute the whole collection and persist it
    pub fn replace_all(&mut self, records: Vec<Quote>) {
        if let Some(max) = records.iter().map(|q| q.id).max() {
            self.last_id = self.last_id.max(max);
        }
        self.quotes = records;
        self.save();
        tracing::info!(count = self.quotes.len(), "replaced quote collection");
    }

    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.id == id)
    }

    /// Case-insensitive text lookup
    pub fn contains_text(&self, text: &str) -> bool {
        let key = text_key(text);
        self.quotes.iter().any(|q| q.text_key() == key)
    }

    /// Sorted distinct categories
    pub fn categories(&self) -> Vec<String> {
        self.quotes
            .iter()
            .map(|q| q.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Highest id handed out or loaded so far
    pub fn last_id(&self) -> i64 {
        self.last_id
    }

    /// True after a failed write, until the next successful one
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn storage(&self) -> &dyn KeyValueStorage {
        self.storage.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuoteError;
    use crate::infrastructure::MemoryStorage;

    /// Storage whose writes always fail
    struct ReadOnlyStorage(MemoryStorage);

    impl KeyValueStorage for ReadOnlyStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.0.get(key)
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(QuoteError::Storage("quota exceeded".to_string()))
        }
        fn remove(&self, key: &str) -> Result<()> {
            self.0.remove(key)
        }
        fn clear(&self) -> Result<()> {
            self.0.clear()
        }
    }

    fn empty_store() -> (QuoteStore, MemoryStorage) {
        let storage = MemoryStorage::new();
        storage.set(QUOTES_KEY, "[]").unwrap();
        (QuoteStore::load(Box::new(storage.clone())), storage)
    }

    #[test]
    fn test_load_seeds_defaults_when_absent() {
        let storage = MemoryStorage::new();
        let store = QuoteStore::load(Box::new(storage.clone()));
        assert_eq!(store.len(), 10);
        assert!(storage.get(QUOTES_KEY).unwrap().is_some());
    }

    #[test]
    fn test_load_seeds_defaults_when_unparseable() {
        let storage = MemoryStorage::new();
        storage.set(QUOTES_KEY, "{{{ nope").unwrap();
        let store = QuoteStore::load(Box::new(storage));
        assert_eq!(store.len(), 10);
    }

    #[test]
    fn test_load_fills_missing_fields() {
        let storage = MemoryStorage::new();
        storage
            .set(
                QUOTES_KEY,
                r#"[
                    {"text": "An old record without extras.", "category": "Legacy"},
                    {"text": "A newer record with an id.", "category": "legacy", "id": 5, "favorite": true}
                ]"#,
            )
            .unwrap();

        let store = QuoteStore::load(Box::new(storage));
        assert_eq!(store.len(), 2);

        let old = &store.quotes()[0];
        assert_eq!(old.category, "legacy");
        assert!(!old.favorite);
        assert!(old.id > 5);

        let newer = store.get(5).unwrap();
        assert!(newer.favorite);
    }

    #[test]
    fn test_load_drops_invalid_and_duplicate_records() {
        let storage = MemoryStorage::new();
        storage
            .set(
                QUOTES_KEY,
                r#"[
                    {"text": "Keep this one around.", "category": "a"},
                    {"text": "KEEP THIS ONE AROUND.", "category": "b"},
                    {"text": "short", "category": "a"},
                    {"category": "missing text"}
                ]"#,
            )
            .unwrap();

        let store = QuoteStore::load(Box::new(storage));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_then_load_contains_record_once() {
        let (mut store, storage) = empty_store();
        let added = store
            .add(QuoteDraft::new("Well done is better than well said.", "Wisdom"))
            .unwrap();

        let reloaded = QuoteStore::load(Box::new(storage));
        let matches: Vec<&Quote> = reloaded
            .quotes()
            .iter()
            .filter(|q| q.text == "Well done is better than well said.")
            .collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0], &added);
        assert_eq!(matches[0].category, "wisdom");
    }

    #[test]
    fn test_add_rejects_too_short_and_leaves_store_unchanged() {
        let (mut store, _) = empty_store();
        store
            .add(QuoteDraft::new(
                "Believe you can and you're halfway there.",
                "belief",
            ))
            .unwrap();
        let before = store.quotes().to_vec();

        let err = store.add(QuoteDraft::new("Too short", "x")).unwrap_err();
        match err {
            QuoteError::Validation(ValidationError::TooShort { min, .. }) => assert_eq!(min, 10),
            other => panic!("Expected TooShort, got {:?}", other),
        }
        assert_eq!(store.quotes(), before.as_slice());
    }

    #[test]
    fn test_add_rejects_case_insensitive_duplicate() {
        let (mut store, _) = empty_store();
        store
            .add(QuoteDraft::new("Simplicity is the soul of efficiency.", "code"))
            .unwrap();
        let err = store
            .add(QuoteDraft::new("  SIMPLICITY is the soul of efficiency. ", "other"))
            .unwrap_err();
        assert!(matches!(
            err,
            QuoteError::Validation(ValidationError::Duplicate(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let (mut store, _) = empty_store();
        let a = store.add(QuoteDraft::new("First quote in a hurry.", "x")).unwrap();
        let b = store.add(QuoteDraft::new("Second quote in a hurry.", "x")).unwrap();
        let c = store.add(QuoteDraft::new("Third quote in a hurry.", "x")).unwrap();
        assert!(a.id < b.id && b.id < c.id);
    }

    #[test]
    fn test_toggle_favorite() {
        let (mut store, storage) = empty_store();
        let quote = store.add(QuoteDraft::new("Favorites can be flipped.", "x")).unwrap();

        assert_eq!(store.toggle_favorite(quote.id), Some(true));
        assert!(QuoteStore::load(Box::new(storage)).get(quote.id).unwrap().favorite);
        assert_eq!(store.toggle_favorite(quote.id), Some(false));
    }

    #[test]
    fn test_toggle_favorite_unknown_id_is_noop() {
        let (mut store, _) = empty_store();
        store.add(QuoteDraft::new("Nothing to see here.", "x")).unwrap();
        let before = store.quotes().to_vec();
        assert_eq!(store.toggle_favorite(-1), None);
        assert_eq!(store.quotes(), before.as_slice());
    }

    #[test]
    fn test_replace_all_persists() {
        let storage = MemoryStorage::new();
        let mut store = QuoteStore::load(Box::new(storage.clone()));
        let kept = store.quotes()[..2].to_vec();

        store.replace_all(kept.clone());

        assert_eq!(QuoteStore::load(Box::new(storage)).quotes(), kept.as_slice());
    }

    #[test]
    fn test_extend_reports_each_entry() {
        let (mut store, _) = empty_store();
        let outcomes = store.extend(vec![
            QuoteDraft::new("One good quote to add.", "a"),
            QuoteDraft::new("tiny", "a"),
            QuoteDraft::new("one GOOD quote to add.", "b"),
        ]);
        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1], Err(ValidationError::TooShort { .. })));
        assert!(matches!(outcomes[2], Err(ValidationError::Duplicate(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_categories_sorted_distinct() {
        let store = QuoteStore::load(Box::new(MemoryStorage::new()));
        let categories = store.categories();
        assert_eq!(categories.len(), 9);
        assert_eq!(categories[0], "action");
        assert!(categories.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_storage_failure_degrades_without_error() {
        let inner = MemoryStorage::new();
        let mut store = QuoteStore::load(Box::new(ReadOnlyStorage(inner.clone())));
        assert!(store.is_degraded());
        assert_eq!(store.len(), 10);

        let added = store.add(QuoteDraft::new("Still works in memory.", "x"));
        assert!(added.is_ok());
        assert_eq!(store.len(), 11);
        assert!(inner.get(QUOTES_KEY).unwrap().is_none());
    }
}
