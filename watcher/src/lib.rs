//! # Event Watcher
//!
//! This crate provides the orchestration layer of eventwatch: a registry of
//! named source watchers multiplexed onto a single consumer-facing stream.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      EventNotifier                         │
//! ├────────────────────────────────────────────────────────────┤
//! │  SourceConfig ──► EventWatcher ──► EventEntry              │
//! │       │               │                │                   │
//! │       ▼               ▼                ▼                   │
//! │  EventLogSource   watch loop      mpsc receiver            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each watcher owns one [`eventwatch_eventlog::EventLogSource`] and runs a
//! dedicated loop: wait for data-ready or cancellation, read the newly
//! appended bytes (growing the buffer when the source asks for more), and
//! push the payload onto the shared channel. The notifier guarantees the
//! channel closes only after every watcher loop has exited.

pub mod config;
pub mod entry;
pub mod error;
pub mod notifier;
pub mod watcher;

pub use config::{SourceConfig, SourceKind};
pub use entry::EventEntry;
pub use error::{NotifierError, Result};
pub use notifier::{EventNotifier, WatcherHandle};
