//! Configuration for watched sources.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default size of the first read attempt, in bytes.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// How long a file source settles after a change before reading.
pub const DEFAULT_FILE_DEBOUNCE: Duration = Duration::from_millis(20);

/// Configuration for one watched source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique name of the source; the registry key.
    pub name: String,

    /// What backs the source.
    pub kind: SourceKind,

    /// Size of the first read attempt. Grows on demand when the source
    /// reports the buffer was too small.
    pub read_buffer_size: usize,

    /// Settle time between the data-ready wake and the read.
    pub debounce: Option<Duration>,
}

impl SourceConfig {
    /// Config for a file-backed source.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::File { path: path.into() },
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            debounce: Some(DEFAULT_FILE_DEBOUNCE),
        }
    }

    /// Config for an in-memory synthetic source.
    pub fn memory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Memory,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            debounce: None,
        }
    }

    /// Set the size of the first read attempt.
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Set the settle time between wake and read.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = Some(debounce);
        self
    }

    /// Disable the settle time.
    pub fn without_debounce(mut self) -> Self {
        self.debounce = None;
        self
    }
}

/// What backs a watched source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A file on disk, watched via filesystem change notifications.
    File { path: PathBuf },

    /// An in-process append-only buffer (tests, synthetic feeds).
    Memory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_file_config_defaults() {
        let config = SourceConfig::file("app", "/var/log/app.log");
        assert_eq!(config.name, "app");
        assert_eq!(config.read_buffer_size, DEFAULT_READ_BUFFER_SIZE);
        assert_eq!(config.debounce, Some(DEFAULT_FILE_DEBOUNCE));
        assert!(matches!(config.kind, SourceKind::File { .. }));
    }

    #[test]
    fn test_builder_overrides() {
        let config = SourceConfig::memory("synth")
            .with_read_buffer_size(64)
            .with_debounce(Duration::from_millis(5));
        assert_eq!(config.read_buffer_size, 64);
        assert_eq!(config.debounce, Some(Duration::from_millis(5)));
    }

    #[test]
    fn test_zero_read_buffer_is_clamped() {
        let config = SourceConfig::memory("synth").with_read_buffer_size(0);
        assert_eq!(config.read_buffer_size, 1);
    }
}
