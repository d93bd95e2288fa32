//! Event surface of the quote widget
//!
//! Every user control maps to a [`Trigger`]; [`QuoteWidget::dispatch`] runs
//! the matching handler and returns an [`Outcome`] for whatever renders it.
//! Storage and network failures are turned into notices here. Validation and
//! parse errors are returned so the caller can show them.

use crate::application::presenter::{Pick, Presenter};
use crate::application::sync::{SyncAgent, SyncReport};
use crate::application::transfer::{self, ExportDocument, ImportReport};
use crate::application::QuoteStore;
use crate::domain::{
    apply_filters, default_drafts, CategoryFilter, FilterSpec, Quote, QuoteDraft, SortOrder,
};
use crate::error::Result;
use crate::infrastructure::storage::{
    read_json, write_json, FILTER_PREFERENCES_KEY, USER_PREFERENCES_KEY,
};
use crate::infrastructure::KeyValueStorage;
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Display preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub show_category: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        UserPreferences {
            show_category: true,
        }
    }
}

/// Named user actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// "Show another quote"
    ShowAnother,
    /// Startup: replay the remembered quote or pick one
    Resume,
    SetCategory(CategoryFilter),
    SetSearch(String),
    SetFavoritesOnly(bool),
    SetSort(SortOrder),
    /// Replace the whole filter state at once
    ApplyFilter(FilterSpec),
    AddQuote(QuoteDraft),
    ToggleFavorite(i64),
    SetShowCategory(bool),
    Export,
    Import(String),
    ClearStorage,
    SyncTick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// What a handler produced
#[derive(Debug, Clone)]
pub enum Outcome {
    Shown(Pick),
    Added(Quote),
    Favorite { id: i64, favorite: Option<bool> },
    Preferences(UserPreferences),
    Exported(ExportDocument),
    Imported(ImportReport),
    Cleared,
    Synced { report: SyncReport, pick: Pick },
    Notice(Notice),
}

pub struct QuoteWidget {
    store: QuoteStore,
    presenter: Presenter,
    prefs_storage: Box<dyn KeyValueStorage>,
    session_storage: Box<dyn KeyValueStorage>,
    filter: FilterSpec,
    preferences: UserPreferences,
    sync: Option<SyncAgent>,
}

impl QuoteWidget {
    /// Load the store and saved preferences from `storage`, session state from `session`
    pub fn open<S, T>(storage: S, session: T, freshness: Duration) -> Self
    where
        S: KeyValueStorage + Clone + 'static,
        T: KeyValueStorage + Clone + 'static,
    {
        let filter = read_json(&storage, FILTER_PREFERENCES_KEY).unwrap_or_default();
        let preferences = read_json(&storage, USER_PREFERENCES_KEY).unwrap_or_default();

        QuoteWidget {
            store: QuoteStore::load(Box::new(storage.clone())),
            presenter: Presenter::new(
                Box::new(session.clone()),
                Box::new(storage.clone()),
                freshness,
            ),
            prefs_storage: Box::new(storage),
            session_storage: Box::new(session),
            filter,
            preferences,
            sync: None,
        }
    }

    pub fn with_sync(mut self, agent: SyncAgent) -> Self {
        self.sync = Some(agent);
        self
    }

    pub fn store(&self) -> &QuoteStore {
        &self.store
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn preferences(&self) -> UserPreferences {
        self.preferences
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    /// Working set for the current filter
    pub fn working_set(&self) -> Vec<&Quote> {
        apply_filters(self.store.quotes(), &self.filter)
    }

    /// Working set for an arbitrary filter, without touching saved state
    pub fn preview(&self, spec: &FilterSpec) -> Vec<&Quote> {
        apply_filters(self.store.quotes(), spec)
    }

    pub fn dispatch(&mut self, trigger: Trigger) -> Result<Outcome> {
        tracing::debug!(?trigger, "dispatch");
        match trigger {
            Trigger::ShowAnother => Ok(Outcome::Shown(self.show_another())),
            Trigger::Resume => Ok(Outcome::Shown(self.resume())),
            Trigger::SetCategory(category) => Ok(self.change_filter(FilterSpec {
                category,
                ..self.filter.clone()
            })),
            Trigger::SetSearch(search) => Ok(self.change_filter(FilterSpec {
                search,
                ..self.filter.clone()
            })),
            Trigger::SetFavoritesOnly(favorites_only) => Ok(self.change_filter(FilterSpec {
                favorites_only,
                ..self.filter.clone()
            })),
            Trigger::SetSort(sort) => Ok(self.change_filter(FilterSpec {
                sort,
                ..self.filter.clone()
            })),
            Trigger::ApplyFilter(spec) => Ok(self.change_filter(spec)),
            Trigger::AddQuote(draft) => self.add_quote(draft),
            Trigger::ToggleFavorite(id) => Ok(Outcome::Favorite {
                id,
                favorite: self.store.toggle_favorite(id),
            }),
            Trigger::SetShowCategory(show) => {
                self.preferences.show_category = show;
                self.save_json(USER_PREFERENCES_KEY, &self.preferences);
                Ok(Outcome::Preferences(self.preferences))
            }
            Trigger::Export => Ok(Outcome::Exported(transfer::export(
                &self.store,
                &self.filter,
            ))),
            Trigger::Import(contents) => {
                let report = transfer::import(&mut self.store, &contents)?;
                Ok(Outcome::Imported(report))
            }
            Trigger::ClearStorage => Ok(self.clear_storage()),
            Trigger::SyncTick => Ok(self.sync_tick()),
        }
    }

    fn show(&mut self, pick: Pick) -> Pick {
        if let Pick::Shown(quote) = &pick {
            self.presenter.remember_last(quote, &self.filter);
        }
        pick
    }

    fn show_another(&mut self) -> Pick {
        let working = apply_filters(self.store.quotes(), &self.filter);
        let pick = self.presenter.pick_one(&working, self.filter.sort);
        self.show(pick)
    }

    fn resume(&mut self) -> Pick {
        let working = apply_filters(self.store.quotes(), &self.filter);
        let pick = self.presenter.resume_or_pick(&working, self.filter.sort);
        self.show(pick)
    }

    fn change_filter(&mut self, spec: FilterSpec) -> Outcome {
        self.filter = spec;
        let filter = self.filter.clone();
        self.save_json(FILTER_PREFERENCES_KEY, &filter);
        self.presenter.reset_cursor();
        Outcome::Shown(self.show_another())
    }

    fn add_quote(&mut self, draft: QuoteDraft) -> Result<Outcome> {
        let quote = self.store.add(draft)?;
        self.presenter.remember_last(&quote, &self.filter);
        Ok(Outcome::Added(quote))
    }

    fn clear_storage(&mut self) -> Outcome {
        for storage in [self.prefs_storage.as_ref(), self.session_storage.as_ref()] {
            if let Err(e) = storage.clear() {
                tracing::warn!(error = %e, "could not clear storage");
            }
        }

        let defaults: Vec<Quote> = default_drafts()
            .into_iter()
            .filter_map(|draft| draft.normalize().ok())
            .map(|draft| self.store.mint(draft))
            .collect();
        self.store.replace_all(defaults);

        self.filter = FilterSpec::default();
        self.preferences = UserPreferences::default();
        self.presenter.reset_cursor();
        tracing::info!("storage cleared, defaults restored");
        Outcome::Cleared
    }

    fn sync_tick(&mut self) -> Outcome {
        let Some(agent) = self.sync.as_mut() else {
            return Outcome::Notice(Notice::info("Sync is not configured"));
        };

        match agent.tick(&mut self.store) {
            Ok(report) => {
                let pick = self.show_another();
                Outcome::Synced { report, pick }
            }
            Err(e) => Outcome::Notice(Notice::warning(format!(
                "Sync failed, local quotes kept: {}",
                e
            ))),
        }
    }

    /// Dispatch `SyncTick` on the agent's interval. `None` runs until the process exits.
    ///
    /// Failed ticks arrive as notices and do not stop the loop.
    pub fn run_sync<F>(&mut self, ticks: Option<usize>, mut on_tick: F)
    where
        F: FnMut(&Outcome),
    {
        let Some(interval) = self.sync.as_ref().map(SyncAgent::interval) else {
            on_tick(&self.sync_tick());
            return;
        };

        let mut done = 0;
        loop {
            let outcome = self.sync_tick();
            on_tick(&outcome);
            done += 1;

            if ticks.is_some_and(|limit| done >= limit) {
                break;
            }
            std::thread::sleep(interval);
        }
    }

    fn save_json<V: Serialize>(&self, key: &str, value: &V) {
        if let Err(e) = write_json(self.prefs_storage.as_ref(), key, value) {
            tracing::warn!(key, error = %e, "could not save preferences");
        }
    }
}
