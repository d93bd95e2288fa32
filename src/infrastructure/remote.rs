//! Remote quote collaborator used by sync

use crate::domain::{Quote, QuoteDraft};
use crate::error::{QuoteError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Category given to records that arrive without one
pub const REMOTE_CATEGORY: &str = "remote";

/// A record as returned by the remote endpoint.
///
/// Quote-shaped records carry `text` and `category`; post-shaped records
/// (`title`, optional `body`) are mapped onto quotes using the title.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RemoteRecord {
    Quote {
        text: String,
        category: String,
        #[serde(default)]
        favorite: bool,
    },
    Post {
        title: String,
        #[serde(default)]
        body: Option<String>,
    },
}

impl RemoteRecord {
    pub fn into_draft(self) -> QuoteDraft {
        match self {
            RemoteRecord::Quote {
                text,
                category,
                favorite,
            } => QuoteDraft::new(text, category).with_favorite(favorite),
            RemoteRecord::Post { title, .. } => QuoteDraft::new(title, REMOTE_CATEGORY),
        }
    }
}

/// Body sent when mirroring a local quote outward
#[derive(Debug, Serialize)]
struct PushBody<'a> {
    title: &'a str,
    body: &'a str,
    text: &'a str,
    category: &'a str,
}

/// Narrow interface to the remote record set
pub trait QuoteRemote {
    /// Fetch the full remote record set
    fn fetch(&self) -> Result<Vec<RemoteRecord>>;

    /// Mirror a locally added quote to the remote
    fn push(&self, quote: &Quote) -> Result<()>;
}

/// HTTP implementation: GET the endpoint for records, POST JSON to push
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpRemote {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuoteError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(HttpRemote {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl QuoteRemote for HttpRemote {
    fn fetch(&self) -> Result<Vec<RemoteRecord>> {
        tracing::debug!(endpoint = %self.endpoint, "fetching remote quotes");

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| QuoteError::Network(format!("GET {} failed: {}", self.endpoint, e)))?;

        let body = response
            .text()
            .map_err(|e| QuoteError::Network(format!("Failed to read response: {}", e)))?;

        parse_records(&body)
    }

    fn push(&self, quote: &Quote) -> Result<()> {
        let body = PushBody {
            title: &quote.text,
            body: &quote.category,
            text: &quote.text,
            category: &quote.category,
        };

        self.client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| QuoteError::Network(format!("POST {} failed: {}", self.endpoint, e)))?;

        tracing::debug!(id = quote.id, "pushed quote to remote");
        Ok(())
    }
}

/// Decode a remote response body.
///
/// Accepts a bare array or an object with a `quotes` array. Entries that match
/// neither record shape are skipped.
pub fn parse_records(body: &str) -> Result<Vec<RemoteRecord>> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| QuoteError::Network(format!("Malformed response: {}", e)))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("quotes") {
            Some(serde_json::Value::Array(items)) => items,
            _ => {
                return Err(QuoteError::Network(
                    "Response has no record list".to_string(),
                ))
            }
        },
        _ => {
            return Err(QuoteError::Network(
                "Response has no record list".to_string(),
            ))
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}
