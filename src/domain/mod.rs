//! Domain layer - Quote records and filtering

pub mod filter;
pub mod quote;

pub use filter::{apply_filters, CategoryFilter, FilterSpec, SortOrder};
pub use quote::{default_drafts, text_key, Quote, QuoteDraft, MIN_TEXT_LEN};
