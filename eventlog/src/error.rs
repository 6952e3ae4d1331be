//! Error types for event log sources and record decoding.

use thiserror::Error;

/// Result type alias for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors from an event log source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Filesystem notification error.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// Operation not supported by this source.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Errors from a single read attempt on a source.
///
/// `BufferTooSmall` and `EndOfLog` are part of the read protocol, not
/// failures: the caller retries with a larger buffer, or ends the attempt.
#[derive(Error, Debug)]
pub enum ReadError {
    /// The supplied buffer cannot hold the pending data; retry with at
    /// least `need` bytes.
    #[error("buffer too small: need {need} bytes")]
    BufferTooSmall { need: usize },

    /// Nothing remains to read past the requested position.
    #[error("end of log")]
    EndOfLog,

    /// The source failed; the read cannot be retried.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Errors from decoding packed records out of a payload.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    /// The record's own header contradicts its bounds.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The payload is shorter than one record header.
    #[error("buffer too small for a record header: need {need} bytes")]
    BufferTooSmall { need: usize },
}
