//! Quote records and the normalization every entry point goes through

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum quote length, counted in characters after trimming
pub const MIN_TEXT_LEN: usize = 10;

/// A stored quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: i64,
    pub text: String,
    pub category: String,
    pub date_added: DateTime<Utc>,
    #[serde(default)]
    pub favorite: bool,
}

impl Quote {
    /// Key used for case-insensitive duplicate detection
    pub fn text_key(&self) -> String {
        text_key(&self.text)
    }
}

/// Lower-cased, trimmed form of a quote text.
pub fn text_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// User-supplied quote before it gets an id and a creation date
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuoteDraft {
    pub text: String,
    pub category: String,
    pub favorite: bool,
    /// Creation date carried over from an imported record
    pub date_added: Option<DateTime<Utc>>,
}

impl QuoteDraft {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        QuoteDraft {
            text: text.into(),
            category: category.into(),
            favorite: false,
            date_added: None,
        }
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    pub fn with_date_added(mut self, date_added: Option<DateTime<Utc>>) -> Self {
        self.date_added = date_added;
        self
    }

    /// Trim text, trim and lower-case category, then validate.
    ///
    /// Duplicate checks need the rest of the collection and are left to the store.
    pub fn normalize(self) -> Result<QuoteDraft, ValidationError> {
        let text = self.text.trim().to_string();
        let category = self.category.trim().to_lowercase();

        if text.is_empty() || category.is_empty() {
            return Err(ValidationError::MissingField);
        }

        let actual = text.chars().count();
        if actual < MIN_TEXT_LEN {
            return Err(ValidationError::TooShort {
                min: MIN_TEXT_LEN,
                actual,
            });
        }

        Ok(QuoteDraft {
            text,
            category,
            favorite: self.favorite,
            date_added: self.date_added,
        })
    }

    /// Turn a normalized draft into a stored quote
    pub fn into_quote(self, id: i64, date_added: DateTime<Utc>) -> Quote {
        Quote {
            id,
            text: self.text,
            category: self.category,
            date_added,
            favorite: self.favorite,
        }
    }
}

const DEFAULT_QUOTES: [(&str, &str); 10] = [
    (
        "The only way to do great work is to love what you do.",
        "motivation",
    ),
    (
        "Innovation distinguishes between a leader and a follower.",
        "innovation",
    ),
    (
        "Life is what happens to you while you're busy making other plans.",
        "life",
    ),
    (
        "The future belongs to those who believe in the beauty of their dreams.",
        "dreams",
    ),
    (
        "It is during our darkest moments that we must focus to see the light.",
        "inspiration",
    ),
    (
        "Success is not final, failure is not fatal: it is the courage to continue that counts.",
        "success",
    ),
    (
        "The only impossible journey is the one you never begin.",
        "motivation",
    ),
    (
        "In the middle of difficulty lies opportunity.",
        "opportunity",
    ),
    ("Believe you can and you're halfway there.", "belief"),
    (
        "The best time to plant a tree was 20 years ago. The second best time is now.",
        "action",
    ),
];

/// The seed collection used when nothing has been persisted yet
pub fn default_drafts() -> Vec<QuoteDraft> {
    DEFAULT_QUOTES
        .iter()
        .map(|(text, category)| QuoteDraft::new(*text, *category))
        .collect()
}
