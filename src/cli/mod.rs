//! CLI layer - Command-line interface

pub mod commands;
pub mod output;

pub use commands::{Cli, Commands, FilterArgs};
pub use output::{format_category_list, format_pick, format_quote_list};
