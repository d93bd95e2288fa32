//! Error types for quotebook

use std::path::PathBuf;
use thiserror::Error;

/// Reasons a quote is rejected before it reaches the store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in both the quote text and the category")]
    MissingField,

    #[error("Quote must be at least {min} characters long (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("This quote already exists: \"{0}\"")]
    Duplicate(String),
}

/// Main error type for quotebook
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Not a quotebook directory: {0}")]
    NotQuotebookDirectory(PathBuf),

    #[error("Invalid quote: {0}")]
    Validation(#[from] ValidationError),

    #[error("No quote with id {0}")]
    QuoteNotFound(i64),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Import error: {0}")]
    Parse(String),

    #[error("Sync error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl QuoteError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            QuoteError::NotQuotebookDirectory(_) => 2,
            QuoteError::Validation(_) => 3,
            QuoteError::Parse(_) => 4,
            QuoteError::Network(_) => 5,
            _ => 1,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn display_with_suggestions(&self) -> String {
        match self {
            QuoteError::NotQuotebookDirectory(path) => {
                format!(
                    "Not a quotebook directory: {}\n\n\
                    Suggestions:\n\
                    • Run 'quotebook init' in this directory to create a new quotebook\n\
                    • Navigate to an existing quotebook directory\n\
                    • Set QUOTEBOOK_ROOT environment variable to your quotebook path",
                    path.display()
                )
            }
            QuoteError::Validation(ValidationError::TooShort { min, .. }) => {
                format!(
                    "{}\n\n\
                    Quotes need at least {} characters of text.\n\
                    Example: quotebook add \"Well done is better than well said.\" --category wisdom",
                    self, min
                )
            }
            QuoteError::Validation(ValidationError::Duplicate(_)) => {
                format!(
                    "{}\n\n\
                    Suggestions:\n\
                    • Duplicates are detected case-insensitively\n\
                    • Use 'quotebook list --search <words>' to find the existing quote",
                    self
                )
            }
            QuoteError::QuoteNotFound(_) => {
                format!("{}\n\nUse 'quotebook list' to see quote ids", self)
            }
            QuoteError::Parse(msg) => {
                format!(
                    "Import error: {}\n\n\
                    Accepted formats:\n\
                    • A JSON array of {{\"text\": ..., \"category\": ...}} objects\n\
                    • An object with a \"quotes\" array (as written by 'quotebook export')",
                    msg
                )
            }
            QuoteError::Network(msg) => {
                format!(
                    "Sync error: {}\n\n\
                    Local quotes were left untouched.\n\
                    Check the endpoint with: quotebook config sync.endpoint",
                    msg
                )
            }
            QuoteError::Config(msg) => {
                if msg.contains("Invalid sync policy") {
                    format!(
                        "{}\n\n\
                        Valid policies: keep-local, server-wins\n\
                        Example: quotebook config sync.policy server-wins",
                        msg
                    )
                } else if msg.contains("Invalid sort order") {
                    format!(
                        "{}\n\n\
                        Valid sort orders: random, alphabetical, category, newest, oldest",
                        msg
                    )
                } else {
                    msg.clone()
                }
            }
            _ => self.to_string(),
        }
    }
}

/// Result type using QuoteError
pub type Result<T> = std::result::Result<T, QuoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_quotebook_directory_suggestion() {
        let err = QuoteError::NotQuotebookDirectory(PathBuf::from("/tmp/test"));
        let msg = err.display_with_suggestions();
        assert!(msg.contains("quotebook init"));
        assert!(msg.contains("QUOTEBOOK_ROOT"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_too_short_reports_minimum() {
        let err = QuoteError::from(ValidationError::TooShort { min: 10, actual: 9 });
        let msg = err.display_with_suggestions();
        assert!(msg.contains("at least 10 characters"));
        assert!(msg.contains("quotebook add"));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_duplicate_suggestions() {
        let err = QuoteError::from(ValidationError::Duplicate("Hello world!".to_string()));
        let msg = err.display_with_suggestions();
        assert!(msg.contains("case-insensitively"));
        assert!(msg.contains("Hello world!"));
    }

    #[test]
    fn test_parse_error_lists_formats() {
        let err = QuoteError::Parse("expected value at line 1".to_string());
        let msg = err.display_with_suggestions();
        assert!(msg.contains("\"quotes\" array"));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_network_error_mentions_untouched() {
        let err = QuoteError::Network("connection refused".to_string());
        assert!(err.display_with_suggestions().contains("left untouched"));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_config_policy_suggestions() {
        let err = QuoteError::Config("Invalid sync policy: 'merge'".to_string());
        let msg = err.display_with_suggestions();
        assert!(msg.contains("keep-local, server-wins"));
    }

    #[test]
    fn test_other_errors_fallback() {
        let err = QuoteError::Storage("disk full".to_string());
        assert_eq!(err.display_with_suggestions(), "Storage error: disk full");
        assert_eq!(err.exit_code(), 1);
    }
}
