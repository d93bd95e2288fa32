//! Output formatting utilities

use crate::application::{ImportReport, Notice, NoticeLevel, Pick, SyncReport, UserPreferences};
use crate::domain::{FilterSpec, Quote};

/// Capitalize the first letter of a category for display
fn display_category(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Format a single quote the way `show` prints it
pub fn format_quote(quote: &Quote, prefs: UserPreferences) -> String {
    let mut output = format!("\"{}\"\n", quote.text);
    if prefs.show_category {
        output.push_str(&format!(
            "    Category: {}\n",
            display_category(&quote.category)
        ));
    }
    output
}

/// Format the result of a pick
pub fn format_pick(pick: &Pick, prefs: UserPreferences) -> String {
    match pick {
        Pick::Empty => "No quotes available for this category.".to_string(),
        Pick::Shown(quote) | Pick::Resumed(quote) => format_quote(quote, prefs),
    }
}

/// Format a working set, one quote per line
pub fn format_quote_list(quotes: &[&Quote]) -> String {
    if quotes.is_empty() {
        return "No quotes found".to_string();
    }

    let mut output = String::new();
    for quote in quotes {
        output.push_str(&format!(
            "{}  {} {}  [{}]\n",
            quote.id,
            if quote.favorite { "*" } else { " " },
            quote.text,
            quote.category
        ));
    }
    output
}

/// Format a list of categories for display
pub fn format_category_list(categories: &[String]) -> String {
    if categories.is_empty() {
        return "No categories found".to_string();
    }

    let mut output = String::new();
    for category in categories {
        output.push_str(&format!("{}\n", category));
    }
    output
}

/// Filter state, one field per line
pub fn format_filter(spec: &FilterSpec) -> String {
    format!(
        "category = {}\nsearch = {}\nfavorites = {}\nsort = {}",
        spec.category, spec.search, spec.favorites_only, spec.sort
    )
}

pub fn format_import_report(report: &ImportReport) -> String {
    if report.is_noop() {
        return format!(
            "No new quotes imported ({} invalid, {} duplicate)",
            report.skipped_invalid, report.skipped_duplicate
        );
    }
    format!(
        "Imported {} quote(s) ({} invalid, {} duplicate skipped)",
        report.imported, report.skipped_invalid, report.skipped_duplicate
    )
}

pub fn format_sync_report(report: &SyncReport) -> String {
    let mut output = format!("Synced {} quote(s) from remote", report.applied);
    if report.kept_local > 0 {
        output.push_str(&format!(", kept {} local", report.kept_local));
    }
    if report.pushed > 0 {
        output.push_str(&format!(", pushed {}", report.pushed));
    }
    if report.push_failures > 0 {
        output.push_str(&format!(", {} push(es) failed", report.push_failures));
    }
    output
}

pub fn format_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Info => notice.message.clone(),
        NoticeLevel::Warning => format!("Warning: {}", notice.message),
    }
}
