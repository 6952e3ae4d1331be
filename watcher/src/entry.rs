//! The notification unit delivered to the consumer.

use serde::{Deserialize, Serialize};

use eventwatch_eventlog::SourceHandle;

/// One notification: a payload of newly appended bytes from one source.
///
/// The payload is raw, exactly as the read returned it, and may hold
/// several packed records; decode it with [`eventwatch_eventlog::decode`].
/// Immutable after creation and owned by the channel until consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEntry {
    /// Name of the source that produced the payload.
    pub source: String,

    /// Opaque handle of the native resource behind the source;
    /// [`SourceHandle::NONE`] for file and memory sources.
    pub handle: SourceHandle,

    /// The newly appended bytes.
    pub payload: Vec<u8>,
}

impl EventEntry {
    /// Create a new entry.
    pub fn new(source: impl Into<String>, handle: SourceHandle, payload: Vec<u8>) -> Self {
        Self {
            source: source.into(),
            handle,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let entry = EventEntry::new("app", SourceHandle::NONE, b"hello".to_vec());
        assert_eq!(entry.source, "app");
        assert_eq!(entry.payload, b"hello");
        assert!(!entry.handle.is_native());
    }
}
