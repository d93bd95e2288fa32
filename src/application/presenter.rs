//! Picks the quote to show and remembers it for the session

use crate::domain::{FilterSpec, Quote, SortOrder};
use crate::infrastructure::storage::{
    read_json, write_json, CURSOR_KEY, LAST_QUOTE_KEY, LAST_VIEWED_KEY,
};
use crate::infrastructure::KeyValueStorage;
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Result of a pick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    /// Working set was empty
    Empty,
    /// Freshly picked from the working set
    Shown(Quote),
    /// Remembered quote replayed from the session
    Resumed(Quote),
}

impl Pick {
    pub fn quote(&self) -> Option<&Quote> {
        match self {
            Pick::Empty => None,
            Pick::Shown(quote) | Pick::Resumed(quote) => Some(quote),
        }
    }
}

/// Session snapshot of the last shown quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastShown {
    pub quote: Quote,
    pub filter: FilterSpec,
    pub timestamp: DateTime<Utc>,
}

pub struct Presenter {
    session: Box<dyn KeyValueStorage>,
    storage: Box<dyn KeyValueStorage>,
    freshness: Duration,
    cursor: usize,
}

impl Presenter {
    pub fn new(
        session: Box<dyn KeyValueStorage>,
        storage: Box<dyn KeyValueStorage>,
        freshness: Duration,
    ) -> Self {
        let cursor = read_json(session.as_ref(), CURSOR_KEY).unwrap_or(0);
        Presenter {
            session,
            storage,
            freshness,
            cursor,
        }
    }

    /// Random element for `random` order, otherwise the next one in round-robin
    pub fn pick_one(&mut self, working_set: &[&Quote], sort: SortOrder) -> Pick {
        if working_set.is_empty() {
            return Pick::Empty;
        }

        let quote = if sort == SortOrder::Random {
            working_set.choose(&mut rand::thread_rng()).copied()
        } else {
            let index = self.cursor % working_set.len();
            self.cursor = (index + 1) % working_set.len();
            self.save_cursor();
            working_set.get(index).copied()
        };

        quote.cloned().map_or(Pick::Empty, Pick::Shown)
    }

    fn save_cursor(&self) {
        if let Err(e) = write_json(self.session.as_ref(), CURSOR_KEY, &self.cursor) {
            tracing::warn!(error = %e, "could not persist presenter cursor");
        }
    }

    /// Reset the round-robin to the start of the working set
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
        self.save_cursor();
    }

    /// Store the shown quote and its filter context with the current time
    pub fn remember_last(&self, quote: &Quote, filter: &FilterSpec) {
        let snapshot = LastShown {
            quote: quote.clone(),
            filter: filter.clone(),
            timestamp: Utc::now(),
        };

        if let Err(e) = write_json(self.session.as_ref(), LAST_QUOTE_KEY, &snapshot) {
            tracing::warn!(error = %e, "could not remember last quote in session");
        }
        if let Err(e) = write_json(self.storage.as_ref(), LAST_VIEWED_KEY, &snapshot) {
            tracing::warn!(error = %e, "could not persist last viewed quote");
        }
    }

    pub fn last_shown(&self) -> Option<LastShown> {
        read_json(self.session.as_ref(), LAST_QUOTE_KEY)
    }

    /// Last viewed quote from durable storage, kept across sessions
    pub fn last_viewed(&self) -> Option<LastShown> {
        read_json(self.storage.as_ref(), LAST_VIEWED_KEY)
    }

    fn is_fresh(&self, snapshot: &LastShown, now: DateTime<Utc>) -> bool {
        let age = now - snapshot.timestamp;
        age >= Duration::zero() && age < self.freshness
    }

    /// Replay the remembered quote if it is within the freshness window, else pick anew
    pub fn resume_or_pick(&mut self, working_set: &[&Quote], sort: SortOrder) -> Pick {
        match self.last_shown() {
            Some(snapshot) if self.is_fresh(&snapshot, Utc::now()) => {
                tracing::debug!(id = snapshot.quote.id, "resuming last shown quote");
                Pick::Resumed(snapshot.quote)
            }
            _ => self.pick_one(working_set, sort),
        }
    }
}
