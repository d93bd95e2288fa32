//! Configuration management

use crate::error::{QuoteError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";

/// How a successful sync combines remote records with the local collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPolicy {
    /// Remote set plus local quotes added since the last successful sync
    #[default]
    KeepLocal,
    /// Remote set replaces the local collection outright
    ServerWins,
}

impl FromStr for SyncPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep-local" => Ok(SyncPolicy::KeepLocal),
            "server-wins" => Ok(SyncPolicy::ServerWins),
            _ => Err(format!(
                "Invalid sync policy: '{}'. Valid policies are: keep-local, server-wins",
                s
            )),
        }
    }
}

impl fmt::Display for SyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncPolicy::KeepLocal => write!(f, "keep-local"),
            SyncPolicy::ServerWins => write!(f, "server-wins"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub endpoint: String,
    pub interval_secs: u64,
    pub timeout_secs: u64,
    pub policy: SyncPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            interval_secs: 30,
            timeout_secs: 10,
            policy: SyncPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub created: DateTime<Utc>,
    #[serde(default = "default_freshness_minutes")]
    pub freshness_minutes: u64,
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_freshness_minutes() -> u64 {
    60
}

/// Longest resume window accepted: one year
pub const MAX_FRESHNESS_MINUTES: u64 = 60 * 24 * 365;

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Self {
        Config {
            created: Utc::now(),
            freshness_minutes: default_freshness_minutes(),
            sync: SyncConfig::default(),
        }
    }

    /// Resume window as a duration. Rejects values a hand-edited file may carry.
    pub fn freshness(&self) -> Result<chrono::Duration> {
        let invalid = || {
            QuoteError::Config(format!(
                "freshness_minutes must be at most {}, got {}",
                MAX_FRESHNESS_MINUTES, self.freshness_minutes
            ))
        };
        if self.freshness_minutes > MAX_FRESHNESS_MINUTES {
            return Err(invalid());
        }
        let minutes = i64::try_from(self.freshness_minutes).map_err(|_| invalid())?;
        chrono::Duration::try_minutes(minutes).ok_or_else(invalid)
    }

    /// Load config from .quotebook/config.toml in the given directory
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(".quotebook").join("config.toml");

        let contents = fs::read_to_string(&config_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                QuoteError::NotQuotebookDirectory(path.to_path_buf())
            } else {
                QuoteError::Io(e)
            }
        })?;

        toml::from_str(&contents)
            .map_err(|e| QuoteError::Config(format!("Failed to parse config.toml: {}", e)))
    }

    /// Save config to .quotebook/config.toml in the given directory
    pub fn save_to_dir(&self, path: &Path) -> Result<()> {
        let quotebook_dir = path.join(".quotebook");
        let config_path = quotebook_dir.join("config.toml");

        if !quotebook_dir.exists() {
            fs::create_dir(&quotebook_dir)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| QuoteError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Get a single value by dotted key
    pub fn get(&self, key: &str) -> Result<String> {
        match key {
            "created" => Ok(self.created.to_rfc3339()),
            "freshness_minutes" => Ok(self.freshness_minutes.to_string()),
            "sync.endpoint" => Ok(self.sync.endpoint.clone()),
            "sync.interval_secs" => Ok(self.sync.interval_secs.to_string()),
            "sync.timeout_secs" => Ok(self.sync.timeout_secs.to_string()),
            "sync.policy" => Ok(self.sync.policy.to_string()),
            _ => Err(Self::unknown_key(key)),
        }
    }

    /// Set a single value by dotted key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "created" => {
                return Err(QuoteError::Config(
                    "Cannot modify 'created' field (read-only)".to_string(),
                ));
            }
            "freshness_minutes" => {
                let minutes = parse_number(key, value)?;
                if minutes > MAX_FRESHNESS_MINUTES {
                    return Err(QuoteError::Config(format!(
                        "freshness_minutes must be at most {} (one year)",
                        MAX_FRESHNESS_MINUTES
                    )));
                }
                self.freshness_minutes = minutes;
            }
            "sync.endpoint" => {
                if value.trim().is_empty() {
                    return Err(QuoteError::Config(
                        "sync.endpoint cannot be empty".to_string(),
                    ));
                }
                self.sync.endpoint = value.trim().to_string();
            }
            "sync.interval_secs" => self.sync.interval_secs = parse_positive(key, value)?,
            "sync.timeout_secs" => self.sync.timeout_secs = parse_positive(key, value)?,
            "sync.policy" => {
                self.sync.policy = SyncPolicy::from_str(value).map_err(QuoteError::Config)?;
            }
            _ => return Err(Self::unknown_key(key)),
        }
        Ok(())
    }

    /// All keys with their current values, in display order
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        Self::KEYS
            .iter()
            .filter_map(|key| self.get(key).ok().map(|value| (*key, value)))
            .collect()
    }

    const KEYS: [&'static str; 6] = [
        "created",
        "freshness_minutes",
        "sync.endpoint",
        "sync.interval_secs",
        "sync.timeout_secs",
        "sync.policy",
    ];

    fn unknown_key(key: &str) -> QuoteError {
        QuoteError::Config(format!(
            "Unknown config key: '{}'. Valid keys are: {}",
            key,
            Self::KEYS.join(", ")
        ))
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| QuoteError::Config(format!("{} expects a number, got '{}'", key, value)))
}

fn parse_positive(key: &str, value: &str) -> Result<u64> {
    let number = parse_number(key, value)?;
    if number == 0 {
        return Err(QuoteError::Config(format!("{} must be at least 1", key)));
    }
    Ok(number)
}
