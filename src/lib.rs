//! quotebook - Quote collection manager
//!
//! Stores short quotes tagged with a category, picks a random or filtered one
//! to show, imports and exports JSON documents, and syncs with a remote
//! endpoint under an explicit merge policy.

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::QuoteError;
