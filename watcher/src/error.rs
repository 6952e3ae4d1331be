//! Error types for the watch registry.

use thiserror::Error;

use eventwatch_eventlog::SourceError;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, NotifierError>;

/// Errors returned by [`crate::EventNotifier`] operations.
///
/// Watcher-loop failures are not represented here: a loop runs detached,
/// and its errors terminate only that watcher (logged, never returned).
#[derive(Error, Debug)]
pub enum NotifierError {
    /// A watcher with this name is already registered.
    #[error("event watcher already exists: {0}")]
    DuplicateSource(String),

    /// No watcher with this name is registered.
    #[error("event watcher not found: {0}")]
    SourceNotFound(String),

    /// Opening the source or querying its initial position failed; the
    /// name was never registered.
    #[error("watcher initialization failed: {0}")]
    Init(#[from] SourceError),
}
