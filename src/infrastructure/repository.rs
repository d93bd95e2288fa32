//! Quotebook directory discovery and layout

use crate::error::{QuoteError, Result};
use crate::infrastructure::{Config, FileStorage};
use std::fs;
use std::path::{Path, PathBuf};

const QUOTEBOOK_DIR: &str = ".quotebook";
const STORE_DIR: &str = "store";
const SESSION_DIR: &str = "session";

/// Abstract repository for quotebook operations
pub trait QuotebookRepository {
    /// Get the root directory of this repository
    fn root(&self) -> &Path;

    /// Load configuration from .quotebook/config.toml
    fn load_config(&self) -> Result<Config>;

    /// Save configuration to .quotebook/config.toml
    fn save_config(&self, config: &Config) -> Result<()>;

    /// Check if .quotebook directory exists
    fn is_initialized(&self) -> bool;

    /// Create .quotebook directory structure
    fn initialize(&self) -> Result<()>;
}

/// File system implementation of QuotebookRepository
#[derive(Debug, Clone)]
pub struct FileSystemRepository {
    pub root: PathBuf,
}

impl FileSystemRepository {
    /// Create a new repository with the given root directory
    pub fn new(root: PathBuf) -> Self {
        FileSystemRepository { root }
    }

    /// Discover quotebook root by walking up from current directory
    /// First checks QUOTEBOOK_ROOT environment variable, then falls back to discovery
    pub fn discover() -> Result<Self> {
        if let Ok(root_path) = std::env::var("QUOTEBOOK_ROOT") {
            let path = PathBuf::from(root_path);
            if Self::has_quotebook_dir(&path) {
                return Ok(FileSystemRepository::new(path));
            } else {
                return Err(QuoteError::Config(format!(
                    "QUOTEBOOK_ROOT is set to '{}' but no .quotebook directory found. \
                    Run 'quotebook init' in that directory or unset QUOTEBOOK_ROOT.",
                    path.display()
                )));
            }
        }

        let current_dir = std::env::current_dir()?;
        Self::discover_from(&current_dir)
    }

    /// Discover quotebook root by walking up from a specific starting directory
    pub fn discover_from(start: &Path) -> Result<Self> {
        let mut current = start.to_path_buf();

        loop {
            if Self::has_quotebook_dir(&current) {
                return Ok(FileSystemRepository::new(current));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Err(QuoteError::NotQuotebookDirectory(start.to_path_buf())),
            }
        }
    }

    fn has_quotebook_dir(path: &Path) -> bool {
        path.join(QUOTEBOOK_DIR).is_dir()
    }

    /// Durable key-value storage (quotes, preferences, sync bookkeeping)
    pub fn storage(&self) -> FileStorage {
        FileStorage::new(self.root.join(QUOTEBOOK_DIR).join(STORE_DIR))
    }

    /// Session-scoped storage, wiped by `clear`
    pub fn session_storage(&self) -> FileStorage {
        FileStorage::new(self.root.join(QUOTEBOOK_DIR).join(SESSION_DIR))
    }
}

impl QuotebookRepository for FileSystemRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn load_config(&self) -> Result<Config> {
        Config::load_from_dir(&self.root)
    }

    fn save_config(&self, config: &Config) -> Result<()> {
        config.save_to_dir(&self.root)
    }

    fn is_initialized(&self) -> bool {
        Self::has_quotebook_dir(&self.root)
    }

    fn initialize(&self) -> Result<()> {
        let quotebook_dir = self.root.join(QUOTEBOOK_DIR);

        if quotebook_dir.exists() {
            return Err(QuoteError::Config(format!(
                "Directory already initialized: {}",
                self.root.display()
            )));
        }

        fs::create_dir(&quotebook_dir)?;
        fs::create_dir(quotebook_dir.join(STORE_DIR))?;
        fs::create_dir(quotebook_dir.join(SESSION_DIR))?;
        Ok(())
    }
}
