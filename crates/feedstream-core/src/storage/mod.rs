//! Persistence layer
//!
//! SQLite-based storage for:
//! - Append-only session structure journals
//! - Saved scroll positions per session

mod database;
mod database_tests;
mod journal;
mod scroll_positions;

pub use database::Database;
pub use journal::SqliteStore;
pub use scroll_positions::ScrollPositionStore;
