//! Feedstream Core - scroll coalescing and session reconciliation for content feeds
//!
//! This crate provides:
//! - A single-threaded task scheduler with a deterministic test clock
//! - Scroll event coalescing, tolerance filtering and position restoration
//! - Session reconciliation of structural feed operations
//! - SQLite-backed session journals and scroll positions

pub mod config;
pub mod constants;
pub mod error;
pub mod scheduler;
pub mod scroll;
pub mod session;
pub mod storage;

// Re-exports for convenience
pub use config::FeedConfig;
pub use error::{ScrollError, SessionError};
pub use scheduler::{Clock, LocalTaskScheduler, MainThreadRunner, ManualScheduler, SystemClock};
pub use scroll::{ScrollListenerNotifier, ScrollLogger, ScrollRestorer, ScrollTracker};
pub use session::{ContentTree, InMemoryStore, Session, SessionMutation, Store};
pub use storage::{Database, ScrollPositionStore, SqliteStore};
