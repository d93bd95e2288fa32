//! Periodic synchronization with the remote quote collaborator

use crate::application::QuoteStore;
use crate::domain::{text_key, Quote};
use crate::error::Result;
use crate::infrastructure::storage::{read_json, write_json, LAST_SYNC_KEY, PENDING_PUSH_KEY};
use crate::infrastructure::{QuoteRemote, SyncPolicy};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// What one successful sync did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records returned by the remote
    pub fetched: usize,
    /// Remote records dropped as invalid or duplicate
    pub dropped: usize,
    /// Remote quotes now in the collection
    pub applied: usize,
    /// Local quotes kept on top of the remote set
    pub kept_local: usize,
    pub pushed: usize,
    pub push_failures: usize,
}

/// Local quote the remote has not returned yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PendingQuote {
    id: i64,
    pushed: bool,
}

/// Persisted between ticks under `pendingPush`.
///
/// Quotes with an id above `watermark` were added locally after the previous
/// sync. `pending` holds older local quotes that must survive until the
/// remote returns their text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncLedger {
    watermark: i64,
    pending: Vec<PendingQuote>,
}

impl SyncLedger {
    fn find(&self, id: i64) -> Option<&PendingQuote> {
        self.pending.iter().find(|p| p.id == id)
    }

    fn is_local(&self, quote: &Quote) -> bool {
        quote.id > self.watermark || self.find(quote.id).is_some()
    }

    fn was_pushed(&self, id: i64) -> bool {
        self.find(id).is_some_and(|p| p.pushed)
    }
}

pub struct SyncAgent {
    remote: Box<dyn QuoteRemote>,
    policy: SyncPolicy,
    interval: Duration,
    last_notice: Option<String>,
}

impl SyncAgent {
    pub fn new(remote: Box<dyn QuoteRemote>, policy: SyncPolicy, interval: Duration) -> Self {
        SyncAgent {
            remote,
            policy,
            interval,
            last_notice: None,
        }
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    /// Pause between ticks when running repeatedly
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Message from the most recent failed tick, cleared by a successful one
    pub fn last_notice(&self) -> Option<&str> {
        self.last_notice.as_deref()
    }

    /// Fetch, merge according to the policy, persist, then push local additions.
    ///
    /// A failed fetch leaves the store exactly as it was. Under keep-local a
    /// local quote stays in the collection until the remote returns its text,
    /// and its push is retried on every tick until one succeeds.
    pub fn tick(&mut self, store: &mut QuoteStore) -> Result<SyncReport> {
        // Without a ledger only quotes added from here on count as local
        let mut ledger: SyncLedger = read_json(store.storage(), PENDING_PUSH_KEY)
            .unwrap_or_else(|| SyncLedger {
                watermark: store.last_id(),
                pending: Vec::new(),
            });

        let records = match self.remote.fetch() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "sync fetch failed, keeping local quotes");
                self.last_notice = Some(e.to_string());
                return Err(e);
            }
        };

        let mut report = SyncReport {
            fetched: records.len(),
            ..SyncReport::default()
        };

        let mut remote_keys = HashSet::new();
        let mut remote_drafts = Vec::new();
        for record in records {
            match record.into_draft().normalize() {
                Ok(draft) if remote_keys.insert(text_key(&draft.text)) => remote_drafts.push(draft),
                _ => report.dropped += 1,
            }
        }

        // Pick up anything written by another session while the fetch was in flight
        store.reload();

        let local: Vec<Quote> = store
            .quotes()
            .iter()
            .filter(|q| ledger.is_local(q))
            .cloned()
            .collect();

        let mut merged: Vec<Quote> = remote_drafts
            .into_iter()
            .map(|draft| store.mint(draft))
            .collect();
        report.applied = merged.len();

        let pending: Vec<PendingQuote> = match self.policy {
            SyncPolicy::ServerWins => {
                if !local.is_empty() {
                    tracing::warn!(
                        discarded = local.len(),
                        "server-wins sync discarded local additions"
                    );
                }
                Vec::new()
            }
            SyncPolicy::KeepLocal => {
                let kept: Vec<Quote> = local
                    .into_iter()
                    .filter(|q| !remote_keys.contains(&q.text_key()))
                    .collect();
                report.kept_local = kept.len();
                let pending = kept
                    .iter()
                    .map(|q| PendingQuote {
                        id: q.id,
                        pushed: ledger.was_pushed(q.id),
                    })
                    .collect();
                merged.extend(kept);
                pending
            }
        };
        ledger.pending = pending;

        store.replace_all(merged);

        for entry in ledger.pending.iter_mut().filter(|p| !p.pushed) {
            let Some(quote) = store.get(entry.id) else {
                continue;
            };
            match self.remote.push(quote) {
                Ok(()) => {
                    entry.pushed = true;
                    report.pushed += 1;
                }
                Err(e) => {
                    tracing::warn!(id = quote.id, error = %e, "failed to push quote, will retry");
                    report.push_failures += 1;
                }
            }
        }

        // Taken after minting so remote quotes never count as local additions
        ledger.watermark = store.last_id();
        if let Err(e) = write_json(store.storage(), PENDING_PUSH_KEY, &ledger) {
            tracing::warn!(error = %e, "could not record pending pushes");
        }
        if let Err(e) = write_json(store.storage(), LAST_SYNC_KEY, &Utc::now()) {
            tracing::warn!(error = %e, "could not record sync time");
        }

        self.last_notice = None;
        tracing::info!(
            fetched = report.fetched,
            applied = report.applied,
            kept_local = report.kept_local,
            pushed = report.pushed,
            "sync finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuoteDraft;
    use crate::error::QuoteError;
    use crate::infrastructure::storage::QUOTES_KEY;
    use crate::infrastructure::{KeyValueStorage, MemoryStorage, RemoteRecord};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct FakeRemote {
        records: Rc<RefCell<Option<Vec<RemoteRecord>>>>,
        pushed: Rc<RefCell<Vec<String>>>,
        push_down: Rc<Cell<bool>>,
    }

    impl FakeRemote {
        fn serving(texts: &[(&str, &str)]) -> Self {
            let remote = FakeRemote::default();
            remote.set_records(texts);
            remote
        }

        fn set_records(&self, texts: &[(&str, &str)]) {
            *self.records.borrow_mut() = Some(
                texts
                    .iter()
                    .map(|(text, category)| RemoteRecord::Quote {
                        text: text.to_string(),
                        category: category.to_string(),
                        favorite: false,
                    })
                    .collect(),
            );
        }

        fn fail(&self) {
            *self.records.borrow_mut() = None;
        }
    }

    impl QuoteRemote for FakeRemote {
        fn fetch(&self) -> Result<Vec<RemoteRecord>> {
            self.records
                .borrow()
                .clone()
                .ok_or_else(|| QuoteError::Network("simulated outage".to_string()))
        }

        fn push(&self, quote: &Quote) -> Result<()> {
            if self.push_down.get() {
                return Err(QuoteError::Network("push rejected".to_string()));
            }
            self.pushed.borrow_mut().push(quote.text.clone());
            Ok(())
        }
    }

    fn agent(remote: &FakeRemote, policy: SyncPolicy) -> SyncAgent {
        SyncAgent::new(Box::new(remote.clone()), policy, Duration::from_millis(1))
    }

    fn texts(store: &QuoteStore) -> Vec<String> {
        let mut texts: Vec<String> = store.quotes().iter().map(|q| q.text.clone()).collect();
        texts.sort();
        texts
    }

    #[test]
    fn test_failed_fetch_leaves_store_untouched() {
        let remote = FakeRemote::default();
        remote.fail();
        let mut store = QuoteStore::load(Box::new(MemoryStorage::new()));
        let before = store.quotes().to_vec();
        let mut agent = agent(&remote, SyncPolicy::ServerWins);

        let result = agent.tick(&mut store);

        assert!(matches!(result, Err(QuoteError::Network(_))));
        assert_eq!(store.quotes(), before.as_slice());
        assert!(agent.last_notice().unwrap().contains("simulated outage"));
    }

    #[test]
    fn test_server_wins_replaces_collection() {
        let remote = FakeRemote::serving(&[
            ("Remote quote number one.", "Server"),
            ("Remote quote number two.", "server"),
        ]);
        let storage = MemoryStorage::new();
        let mut store = QuoteStore::load(Box::new(storage.clone()));
        let mut agent = agent(&remote, SyncPolicy::ServerWins);

        let report = agent.tick(&mut store).unwrap();

        assert_eq!(report.applied, 2);
        assert_eq!(
            texts(&store),
            vec!["Remote quote number one.", "Remote quote number two."]
        );
        assert_eq!(store.categories(), vec!["server".to_string()]);
        assert!(agent.last_notice().is_none());
        // persisted
        assert_eq!(QuoteStore::load(Box::new(storage)).len(), 2);
    }

    #[test]
    fn test_remote_invalid_and_duplicate_records_dropped() {
        let remote = FakeRemote::serving(&[
            ("Remote quote number one.", "a"),
            ("REMOTE QUOTE NUMBER ONE.", "b"),
            ("tiny", "a"),
            ("No category at all here.", ""),
        ]);
        let mut store = QuoteStore::load(Box::new(MemoryStorage::new()));

        let report = agent(&remote, SyncPolicy::ServerWins).tick(&mut store).unwrap();

        assert_eq!(report.fetched, 4);
        assert_eq!(report.dropped, 3);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_keep_local_preserves_additions_since_last_sync() {
        let remote = FakeRemote::serving(&[("Remote quote number one.", "server")]);
        let mut store = QuoteStore::load(Box::new(MemoryStorage::new()));
        let mut agent = agent(&remote, SyncPolicy::KeepLocal);

        agent.tick(&mut store).unwrap();
        assert_eq!(store.len(), 1);

        store
            .add(QuoteDraft::new("Added locally between syncs.", "mine"))
            .unwrap();
        let report = agent.tick(&mut store).unwrap();

        assert_eq!(report.kept_local, 1);
        assert_eq!(report.pushed, 1);
        assert_eq!(
            texts(&store),
            vec!["Added locally between syncs.", "Remote quote number one."]
        );
        assert_eq!(
            *remote.pushed.borrow(),
            vec!["Added locally between syncs.".to_string()]
        );

        // Already pushed and not re-counted as new on the next tick
        let report = agent.tick(&mut store).unwrap();
        assert_eq!(report.pushed, 0);
    }

    #[test]
    fn test_server_wins_discards_local_additions() {
        let remote = FakeRemote::serving(&[("Remote quote number one.", "server")]);
        let mut store = QuoteStore::load(Box::new(MemoryStorage::new()));
        let mut agent = agent(&remote, SyncPolicy::ServerWins);

        agent.tick(&mut store).unwrap();
        store
            .add(QuoteDraft::new("Added locally between syncs.", "mine"))
            .unwrap();
        agent.tick(&mut store).unwrap();

        assert_eq!(texts(&store), vec!["Remote quote number one."]);
        assert!(remote.pushed.borrow().is_empty());
    }

    #[test]
    fn test_keep_local_picks_up_writes_from_other_sessions() {
        let remote = FakeRemote::serving(&[("Remote quote number one.", "server")]);
        let storage = MemoryStorage::new();
        let mut store = QuoteStore::load(Box::new(storage.clone()));
        let mut agent = agent(&remote, SyncPolicy::KeepLocal);
        agent.tick(&mut store).unwrap();

        // Another session appends while this one is between ticks
        let mut other = QuoteStore::load(Box::new(storage.clone()));
        other
            .add(QuoteDraft::new("Written by another session.", "other"))
            .unwrap();

        agent.tick(&mut store).unwrap();
        assert!(store.contains_text("Written by another session."));
    }

    #[test]
    fn test_keep_local_drops_local_copy_of_remote_text() {
        let remote = FakeRemote::serving(&[("Remote quote number one.", "server")]);
        let storage = MemoryStorage::new();
        storage.set(QUOTES_KEY, "[]").unwrap();
        let mut store = QuoteStore::load(Box::new(storage));
        let mut agent = agent(&remote, SyncPolicy::KeepLocal);
        agent.tick(&mut store).unwrap();

        remote.set_records(&[
            ("Remote quote number one.", "server"),
            ("Same words on both sides.", "server"),
        ]);
        store
            .add(QuoteDraft::new("same words on both sides.", "mine"))
            .unwrap();

        let report = agent.tick(&mut store).unwrap();
        assert_eq!(report.kept_local, 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_keep_local_retries_failed_push_across_ticks() {
        let remote = FakeRemote::serving(&[("Remote quote number one.", "server")]);
        let storage = MemoryStorage::new();
        let mut store = QuoteStore::load(Box::new(storage.clone()));
        let mut agent = agent(&remote, SyncPolicy::KeepLocal);
        agent.tick(&mut store).unwrap();

        store
            .add(QuoteDraft::new("Added while the remote is down.", "mine"))
            .unwrap();
        remote.push_down.set(true);

        for _ in 0..3 {
            let report = agent.tick(&mut store).unwrap();
            assert_eq!(report.kept_local, 1);
            assert_eq!(report.push_failures, 1);
            assert!(store.contains_text("Added while the remote is down."));
        }

        remote.push_down.set(false);
        let report = agent.tick(&mut store).unwrap();
        assert_eq!(report.pushed, 1);
        assert_eq!(
            *remote.pushed.borrow(),
            vec!["Added while the remote is down.".to_string()]
        );

        // Reopened from storage, the quote is still known as local and already pushed
        let mut reopened = QuoteStore::load(Box::new(storage));
        let report = agent.tick(&mut reopened).unwrap();
        assert_eq!(report.pushed, 0);
        assert!(reopened.contains_text("Added while the remote is down."));
    }

    #[test]
    fn test_keep_local_holds_pushed_quote_until_remote_returns_it() {
        let remote = FakeRemote::serving(&[("Remote quote number one.", "server")]);
        let mut store = QuoteStore::load(Box::new(MemoryStorage::new()));
        let mut agent = agent(&remote, SyncPolicy::KeepLocal);
        agent.tick(&mut store).unwrap();

        store
            .add(QuoteDraft::new("Pushed but never echoed back.", "mine"))
            .unwrap();
        agent.tick(&mut store).unwrap();
        agent.tick(&mut store).unwrap();
        assert!(store.contains_text("Pushed but never echoed back."));
        assert_eq!(remote.pushed.borrow().len(), 1);

        remote.set_records(&[
            ("Remote quote number one.", "server"),
            ("Pushed but never echoed back.", "mine"),
        ]);
        let report = agent.tick(&mut store).unwrap();
        assert_eq!(report.kept_local, 0);
        assert_eq!(store.len(), 2);

        // Now owned by the remote: gone once the remote drops it
        remote.set_records(&[("Remote quote number one.", "server")]);
        agent.tick(&mut store).unwrap();
        assert_eq!(texts(&store), vec!["Remote quote number one."]);
    }

    #[test]
    fn test_keep_local_keeps_imported_quotes_with_old_dates() {
        let remote = FakeRemote::serving(&[("Remote quote number one.", "server")]);
        let mut store = QuoteStore::load(Box::new(MemoryStorage::new()));
        let mut agent = agent(&remote, SyncPolicy::KeepLocal);
        agent.tick(&mut store).unwrap();

        let old = Utc::now() - chrono::Duration::days(365);
        let outcomes = store.extend(vec![QuoteDraft::new("Imported from an old backup.", "archive")
            .with_date_added(Some(old))]);
        assert!(outcomes[0].is_ok());

        let report = agent.tick(&mut store).unwrap();
        assert_eq!(report.kept_local, 1);
        agent.tick(&mut store).unwrap();
        assert!(store.contains_text("Imported from an old backup."));
    }
}
