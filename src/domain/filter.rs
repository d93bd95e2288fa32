//! Working-set derivation: category, search, favorites, then sort

use crate::domain::Quote;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category selector; `All` keeps every quote
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    pub fn matches(&self, quote: &Quote) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(category) => quote.category == *category,
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        let value = value.trim().to_lowercase();
        if value.is_empty() || value == "all" {
            CategoryFilter::All
        } else {
            CategoryFilter::Named(value)
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        CategoryFilter::from(value.to_string())
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        value.to_string()
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "all"),
            CategoryFilter::Named(category) => write!(f, "{}", category),
        }
    }
}

/// Order of the working set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Fresh uniform shuffle on every filter pass
    #[default]
    Random,
    /// By quote text
    Alphabetical,
    /// By category name
    Category,
    /// Most recently added first
    Newest,
    /// Oldest first
    Oldest,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(SortOrder::Random),
            "alphabetical" => Ok(SortOrder::Alphabetical),
            "category" => Ok(SortOrder::Category),
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            _ => Err(format!(
                "Invalid sort order: '{}'. Valid orders are: random, alphabetical, category, newest, oldest",
                s
            )),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortOrder::Random => "random",
            SortOrder::Alphabetical => "alphabetical",
            SortOrder::Category => "category",
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
        };
        write!(f, "{}", name)
    }
}

/// Complete filter state, persisted as the filter preferences
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    pub category: CategoryFilter,
    pub search: String,
    pub favorites_only: bool,
    pub sort: SortOrder,
}

impl FilterSpec {
    /// Filter that only narrows by category
    pub fn by_category(category: impl Into<CategoryFilter>) -> Self {
        FilterSpec {
            category: category.into(),
            ..FilterSpec::default()
        }
    }
}

fn matches_search(quote: &Quote, needle: &str) -> bool {
    needle.is_empty()
        || quote.text.to_lowercase().contains(needle)
        || quote.category.to_lowercase().contains(needle)
}

/// Apply every filter stage in order and sort the result.
///
/// Returns borrowed views into `quotes`; an empty vector is a valid result.
pub fn apply<'a, R: Rng + ?Sized>(
    quotes: &'a [Quote],
    spec: &FilterSpec,
    rng: &mut R,
) -> Vec<&'a Quote> {
    let needle = spec.search.trim().to_lowercase();

    let mut working: Vec<&Quote> = quotes
        .iter()
        .filter(|q| spec.category.matches(q))
        .filter(|q| matches_search(q, &needle))
        .filter(|q| !spec.favorites_only || q.favorite)
        .collect();

    match spec.sort {
        SortOrder::Random => working.shuffle(rng),
        SortOrder::Alphabetical => working.sort_by(|a, b| a.text.cmp(&b.text)),
        SortOrder::Category => working.sort_by(|a, b| a.category.cmp(&b.category)),
        SortOrder::Newest => working.sort_by(|a, b| b.date_added.cmp(&a.date_added)),
        SortOrder::Oldest => working.sort_by(|a, b| a.date_added.cmp(&b.date_added)),
    }

    working
}

/// [`apply`] with the thread-local generator
pub fn apply_filters<'a>(quotes: &'a [Quote], spec: &FilterSpec) -> Vec<&'a Quote> {
    apply(quotes, spec, &mut rand::thread_rng())
}
