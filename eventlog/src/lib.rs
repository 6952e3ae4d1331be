//! # Event Log Sources
//!
//! This crate provides the source layer of eventwatch: the [`EventLogSource`]
//! trait over which the watch engine observes a live, append-only log, plus
//! the decoder for the packed binary record format those logs carry.
//!
//! ## Features
//!
//! - **Record Decoding**: bounds-checked traversal of packed variable-length
//!   records inside a raw payload
//! - **File Fallback**: a file-based source driven by filesystem change
//!   notifications, for platforms without a native event log
//! - **Synthetic Source**: an in-memory append-only source for tests and
//!   demos, including the buffer-growth read protocol
//!
//! Native (OS event log) integrations implement [`EventLogSource`] outside
//! this crate; the trait is the entire surface the watch engine needs.

pub mod error;
pub mod file;
pub mod memory;
pub mod record;
pub mod source;
pub mod types;

pub use error::{ReadError, RecordError, Result, SourceError};
pub use file::FileSource;
pub use memory::{MemoryAppender, MemorySource};
pub use record::{EventLogRecord, RecordIter, decode, encode, parse_record};
pub use source::EventLogSource;
pub use types::{EventType, ReadFlags, SidNameUse, SourceHandle};
