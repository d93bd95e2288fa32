//! Export to and import from JSON documents

use crate::application::QuoteStore;
use crate::domain::{FilterSpec, Quote, QuoteDraft};
use crate::error::{QuoteError, Result, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

/// Format version written into every export
pub const EXPORT_VERSION: &str = "1.0";

/// Full snapshot of the collection, as offered for download
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub quotes: Vec<Quote>,
    pub export_date: DateTime<Utc>,
    pub version: String,
    pub total_quotes: usize,
    pub categories: Vec<String>,
    pub filter_preferences: FilterSpec,
}

impl ExportDocument {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Build the export document for the current collection
pub fn export(store: &QuoteStore, filter: &FilterSpec) -> ExportDocument {
    ExportDocument {
        quotes: store.quotes().to_vec(),
        export_date: Utc::now(),
        version: EXPORT_VERSION.to_string(),
        total_quotes: store.len(),
        categories: store.categories(),
        filter_preferences: filter.clone(),
    }
}

/// Default download name, e.g. `quotes-export-2025-01-17.json`
pub fn export_filename(date: NaiveDate) -> String {
    format!("quotes-export-{}.json", date.format("%Y-%m-%d"))
}

/// Per-entry outcome counts of an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped_invalid: usize,
    pub skipped_duplicate: usize,
}

impl ImportReport {
    /// Nothing was added
    pub fn is_noop(&self) -> bool {
        self.imported == 0
    }
}

/// Pull the candidate list out of a bare array or an object with a `quotes` array
fn candidate_entries(document: Value) -> Result<Vec<Value>> {
    match document {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut map) => match map.remove("quotes") {
            Some(Value::Array(entries)) => Ok(entries),
            Some(_) => Err(QuoteError::Parse(
                "\"quotes\" must be an array".to_string(),
            )),
            None => Err(QuoteError::Parse(
                "document has no \"quotes\" array".to_string(),
            )),
        },
        _ => Err(QuoteError::Parse(
            "expected an array of quotes or an object with a \"quotes\" array".to_string(),
        )),
    }
}

/// An entry is usable only when `text` and `category` are both strings
fn entry_to_draft(entry: &Value) -> Option<QuoteDraft> {
    let text = entry.get("text")?.as_str()?;
    let category = entry.get("category")?.as_str()?;
    let favorite = entry
        .get("favorite")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    // An absent or unreadable date means the quote is dated on import
    let date_added = entry
        .get("dateAdded")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|date| date.with_timezone(&Utc));
    Some(
        QuoteDraft::new(text, category)
            .with_favorite(favorite)
            .with_date_added(date_added),
    )
}

/// Parse `contents` and append every valid, non-duplicate entry.
///
/// A malformed document leaves the store untouched. Zero imported entries is
/// a valid outcome, reported through [`ImportReport::is_noop`].
pub fn import(store: &mut QuoteStore, contents: &str) -> Result<ImportReport> {
    let document: Value = serde_json::from_str(contents)
        .map_err(|e| QuoteError::Parse(format!("invalid JSON: {}", e)))?;
    let entries = candidate_entries(document)?;

    let mut report = ImportReport::default();
    let mut drafts = Vec::with_capacity(entries.len());
    for entry in &entries {
        match entry_to_draft(entry) {
            Some(draft) => drafts.push(draft),
            None => report.skipped_invalid += 1,
        }
    }

    for outcome in store.extend(drafts) {
        match outcome {
            Ok(_) => report.imported += 1,
            Err(ValidationError::Duplicate(_)) => report.skipped_duplicate += 1,
            Err(_) => report.skipped_invalid += 1,
        }
    }

    tracing::info!(
        imported = report.imported,
        invalid = report.skipped_invalid,
        duplicate = report.skipped_duplicate,
        "import finished"
    );
    Ok(report)
}
