//! Application layer - Use cases and orchestration

pub mod init;
pub mod manage_config;
pub mod presenter;
pub mod store;
pub mod sync;
pub mod transfer;
pub mod widget;

pub use presenter::{LastShown, Pick, Presenter};
pub use store::QuoteStore;
pub use sync::{SyncAgent, SyncReport};
pub use transfer::{ExportDocument, ImportReport};
pub use widget::{Notice, NoticeLevel, Outcome, QuoteWidget, Trigger, UserPreferences};
