//! File-based fallback source.
//!
//! On platforms without a native event log, a source can be a plain file:
//! a filesystem change notification stands in for the native "new data
//! appended" signal, and a read returns the whole current file content.
//! These are weaker semantics than incremental native reads; the watch
//! engine still applies its position check, so unchanged files do not emit.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::Notify;
use tracing::{debug, error};

use crate::error::{ReadError, Result};
use crate::source::EventLogSource;
use crate::types::{ReadFlags, SourceHandle};

/// An [`EventLogSource`] backed by one file on disk.
pub struct FileSource {
    path: PathBuf,

    /// Kept alive for the lifetime of the source; dropping it disarms the
    /// change signal.
    watcher: Option<RecommendedWatcher>,
}

impl FileSource {
    /// Open a file source, creating the file if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(&path)?;
        }

        Ok(Self {
            path,
            watcher: None,
        })
    }

    /// The path this source reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventLogSource for FileSource {
    fn handle(&self) -> SourceHandle {
        SourceHandle::NONE
    }

    fn position(&mut self) -> Result<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }

    fn read(
        &mut self,
        _flags: ReadFlags,
        _position: u64,
        _buf_len: usize,
    ) -> std::result::Result<Vec<u8>, ReadError> {
        // Whole-file read: the file is the log. Incremental reads would
        // misbehave under truncate-and-rewrite, which plain log files do.
        let content = fs::read(&self.path).map_err(crate::error::SourceError::from)?;
        if content.is_empty() {
            return Err(ReadError::EndOfLog);
        }
        Ok(content)
    }

    fn register_change_signal(&mut self, signal: Arc<Notify>) -> Result<()> {
        let path = self.path.clone();
        let watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        debug!("file changed: {}", path.display());
                        signal.notify_one();
                    }
                }
                Err(e) => {
                    error!("watch error on {}: {e}", path.display());
                }
            },
        )?;

        self.watcher = Some(watcher);
        if let Some(w) = &mut self.watcher {
            w.watch(&self.path, RecursiveMode::NonRecursive)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");

        let mut source = FileSource::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(source.position().unwrap(), 0);
        assert_eq!(source.handle(), SourceHandle::NONE);
    }

    #[test]
    fn test_read_returns_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, b"hello world").unwrap();

        let mut source = FileSource::open(&path).unwrap();
        assert_eq!(source.position().unwrap(), 11);
        let payload = source
            .read(ReadFlags::SEEK | ReadFlags::FORWARDS, 0, 64)
            .unwrap();
        assert_eq!(payload, b"hello world");
    }

    #[test]
    fn test_empty_file_is_end_of_log() {
        let dir = TempDir::new().unwrap();
        let mut source = FileSource::open(dir.path().join("empty.log")).unwrap();
        assert!(matches!(
            source.read(ReadFlags::SEQUENTIAL, 0, 64),
            Err(ReadError::EndOfLog)
        ));
    }

    #[tokio::test]
    async fn test_change_signal_fires_on_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut source = FileSource::open(&path).unwrap();

        let signal = Arc::new(Notify::new());
        source.register_change_signal(signal.clone()).unwrap();
        let notified = signal.notified();

        fs::write(&path, b"new data").unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), notified)
            .await
            .expect("change signal never fired");
    }
}
