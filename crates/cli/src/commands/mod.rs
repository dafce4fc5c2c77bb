//! CLI command handlers.

mod search;

pub use search::SearchCommand;
