//! The source trait: what the watch engine needs from a log backend.

use std::sync::Arc;

use tokio::sync::Notify;

use crate::error::{ReadError, Result};
use crate::types::{ReadFlags, SourceHandle};

/// A live, append-only log that can be watched.
///
/// Opening a source is the implementor's constructor; releasing the
/// underlying resource is its `Drop`. One watcher owns one source
/// exclusively for its whole lifetime, so implementations never need
/// internal locking.
///
/// Native (OS event log) backends implement this trait outside the core;
/// this crate ships [`crate::FileSource`] and [`crate::MemorySource`].
pub trait EventLogSource: Send {
    /// Opaque reference to the native resource, [`SourceHandle::NONE`] if
    /// there is none.
    fn handle(&self) -> SourceHandle;

    /// The source's current end position (record number or byte offset).
    ///
    /// Monotonically non-decreasing for append-only sources.
    fn position(&mut self) -> Result<u64>;

    /// Read the data appended at `position`, into at most `buf_len` bytes.
    ///
    /// Returns [`ReadError::BufferTooSmall`] with the minimum size that
    /// would succeed when `buf_len` cannot hold the pending span, and
    /// [`ReadError::EndOfLog`] when nothing remains past `position`.
    fn read(
        &mut self,
        flags: ReadFlags,
        position: u64,
        buf_len: usize,
    ) -> std::result::Result<Vec<u8>, ReadError>;

    /// Arm `signal` to fire whenever new data is appended.
    ///
    /// Called once before the watch loop starts waiting. The signal must
    /// keep firing for every subsequent append until the source is dropped.
    fn register_change_signal(&mut self, signal: Arc<Notify>) -> Result<()>;
}
