//! CLI command definitions

use crate::domain::{CategoryFilter, FilterSpec, SortOrder};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(name = "quotebook")]
#[command(about = "Keep, browse and sync a collection of quotes", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error); defaults to QUOTEBOOK_LOG or warn
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Filter flags shared by show, list and filter
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Category to show ("all" for every category)
    #[arg(short, long)]
    pub category: Option<String>,

    /// Case-insensitive text or category search
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only favorites (pass false to turn off)
    #[arg(short, long, num_args = 0..=1, default_missing_value = "true")]
    pub favorites: Option<bool>,

    /// Sort order (random, alphabetical, category, newest, oldest)
    #[arg(long)]
    pub sort: Option<String>,
}

impl FilterArgs {
    /// No flag was given
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.search.is_none()
            && self.favorites.is_none()
            && self.sort.is_none()
    }

    /// Override the fields of `base` that were given on the command line
    pub fn apply_to(&self, base: &FilterSpec) -> Result<FilterSpec, String> {
        let mut spec = base.clone();
        if let Some(category) = &self.category {
            spec.category = CategoryFilter::from(category.as_str());
        }
        if let Some(search) = &self.search {
            spec.search = search.clone();
        }
        if let Some(favorites) = self.favorites {
            spec.favorites_only = favorites;
        }
        if let Some(sort) = &self.sort {
            spec.sort = SortOrder::from_str(sort)?;
        }
        Ok(spec)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new quotebook
    Init {
        /// Directory to initialize (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Remote endpoint used by sync
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Show a quote (resumes the last one shown within the freshness window)
    Show {
        #[command(flatten)]
        filter: FilterArgs,

        /// Always pick a new quote
        #[arg(long)]
        fresh: bool,
    },

    /// List the quotes matching the current or given filter
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List all categories
    Categories,

    /// Add a new quote
    Add {
        /// Quote text (at least 10 characters)
        text: String,

        /// Category for the quote
        #[arg(short, long)]
        category: String,

        /// Mark the quote as a favorite
        #[arg(short, long)]
        favorite: bool,
    },

    /// Toggle the favorite flag of a quote
    Favorite {
        /// Quote id (see 'quotebook list')
        id: i64,
    },

    /// Save filter preferences
    Filter {
        #[command(flatten)]
        filter: FilterArgs,

        /// Reset to defaults (all categories, random order)
        #[arg(long)]
        reset: bool,
    },

    /// Export all quotes to a JSON file
    Export {
        /// Output file ("-" for stdout; default: quotes-export-<date>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import quotes from a JSON file
    Import {
        /// File with an array of quotes or an object with a "quotes" array
        path: PathBuf,
    },

    /// Clear stored data and restore the default quotes
    Clear,

    /// Synchronize with the remote endpoint
    Sync {
        /// Keep syncing on the configured interval
        #[arg(short, long)]
        watch: bool,

        /// Stop after this many syncs when watching
        #[arg(long)]
        ticks: Option<usize>,
    },

    /// View or modify configuration
    Config {
        /// Config key to get or set
        key: Option<String>,

        /// Value to set (if provided, sets the key)
        value: Option<String>,

        /// List all configuration
        #[arg(short, long)]
        list: bool,
    },

    /// View or change display preferences
    Prefs {
        /// Show the category under each quote
        #[arg(long)]
        show_category: Option<bool>,
    },
}
