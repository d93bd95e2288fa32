//! Initialize quotebook use case

use crate::application::QuoteStore;
use crate::error::{QuoteError, Result};
use crate::infrastructure::{Config, FileSystemRepository, QuotebookRepository};
use std::fs;
use std::path::Path;

/// Initialize a new quotebook at the specified path and seed the default quotes.
///
/// Returns the number of quotes in the new collection.
pub fn init(path: &Path, endpoint: Option<&str>) -> Result<usize> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }

    let repo = FileSystemRepository::new(path.to_path_buf());
    repo.initialize()?;

    let mut config = Config::new();
    if let Some(endpoint) = endpoint {
        config.set("sync.endpoint", endpoint)?;
    }
    repo.save_config(&config)?;

    let store = QuoteStore::load(Box::new(repo.storage()));
    if store.is_degraded() {
        return Err(QuoteError::Storage(format!(
            "could not write quotes under {}",
            repo.storage().dir().display()
        )));
    }

    tracing::info!(root = %path.display(), "initialized quotebook");
    Ok(store.len())
}
