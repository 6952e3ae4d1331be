//! The per-source watch loop.
//!
//! One `EventWatcher` exclusively owns one source, its read cursor, and its
//! data-ready signal. Its loop blocks on exactly one suspension point, a
//! wait-for-any over {data-ready, cancel}, then reads the newly appended
//! bytes and pushes them onto the shared channel. Blocking on that push
//! when the consumer lags is the intended back-pressure point.
//!
//! A watcher moves through `init` (acquire the source and record its
//! current end position), `listen` (the loop, spawned by the registry on
//! its own task), and exit (cancellation, consumer gone, or a fatal source
//! error). Dropping the source on exit releases the native resource
//! exactly once; errors in the loop terminate this watcher only and are
//! reported through logging, never to a caller.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use eventwatch_eventlog::{EventLogSource, ReadError, ReadFlags, SourceError, SourceHandle};

use crate::config::SourceConfig;
use crate::entry::EventEntry;

/// Why the watch loop resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    /// The source signaled newly appended data.
    DataReady,
    /// Shutdown was requested.
    Cancelled,
}

pub(crate) struct EventWatcher {
    name: String,
    source: Box<dyn EventLogSource>,
    source_handle: SourceHandle,
    cursor: u64,
    data_ready: Arc<Notify>,
    cancel: CancellationToken,
    config: SourceConfig,
    tx: mpsc::Sender<EventEntry>,
}

impl EventWatcher {
    /// Acquire the source's starting position and signals.
    ///
    /// On error the watcher does not exist; the registry never sees it.
    pub(crate) fn init(
        config: SourceConfig,
        mut source: Box<dyn EventLogSource>,
        cancel: CancellationToken,
        tx: mpsc::Sender<EventEntry>,
    ) -> Result<Self, SourceError> {
        let cursor = source.position()?;
        Ok(Self {
            name: config.name.clone(),
            source_handle: source.handle(),
            source,
            cursor,
            data_ready: Arc::new(Notify::new()),
            cancel,
            config,
            tx,
        })
    }

    pub(crate) fn source_handle(&self) -> SourceHandle {
        self.source_handle
    }

    /// Run the watch loop until cancellation or a fatal source error.
    pub(crate) async fn listen(mut self) {
        if let Err(e) = self.source.register_change_signal(self.data_ready.clone()) {
            error!("watcher {}: failed to arm change signal: {e}", self.name);
            return;
        }
        info!("watcher {} listening", self.name);

        loop {
            match self.wait().await {
                Wake::Cancelled => {
                    debug!("watcher {}: cancelled", self.name);
                    break;
                }
                Wake::DataReady => {
                    if let Some(settle) = self.config.debounce {
                        tokio::time::sleep(settle).await;
                    }

                    let position = match self.source.position() {
                        Ok(position) => position,
                        Err(e) => {
                            error!("watcher {}: position query failed: {e}", self.name);
                            break;
                        }
                    };
                    if position == self.cursor {
                        // Duplicate wakeup; nothing was appended.
                        debug!("watcher {}: spurious wake at {position}", self.name);
                        continue;
                    }
                    let previous = self.cursor;
                    self.cursor = position;

                    match self.read_from(previous) {
                        Ok(Some(payload)) => {
                            let entry =
                                EventEntry::new(self.name.clone(), self.source_handle, payload);
                            if self.tx.send(entry).await.is_err() {
                                // The consumer is gone; no one left to notify.
                                debug!("watcher {}: channel closed", self.name);
                                break;
                            }
                        }
                        Ok(None) => {
                            debug!("watcher {}: end of log at {previous}", self.name);
                        }
                        Err(e) => {
                            error!("watcher {}: read failed: {e}", self.name);
                            break;
                        }
                    }
                }
            }
        }

        info!("watcher {} stopped", self.name);
        // Dropping `self.source` releases the native resource.
    }

    /// Block until one of the wake conditions fires.
    ///
    /// No timeout: the wait may be indefinite, but cancellation is
    /// level-triggered and can always preempt it.
    async fn wait(&mut self) -> Wake {
        tokio::select! {
            _ = self.cancel.cancelled() => Wake::Cancelled,
            _ = self.data_ready.notified() => Wake::DataReady,
        }
    }

    /// Read newly appended bytes starting at `position`.
    ///
    /// Grows the buffer when the source reports it too small and retries;
    /// `Ok(None)` means the attempt ended benignly at end of log.
    fn read_from(&mut self, position: u64) -> Result<Option<Vec<u8>>, SourceError> {
        let mut buf_len = self.config.read_buffer_size;
        loop {
            match self
                .source
                .read(ReadFlags::SEEK | ReadFlags::FORWARDS, position, buf_len)
            {
                Ok(payload) => return Ok(Some(payload)),
                Err(ReadError::BufferTooSmall { need }) => {
                    debug!(
                        "watcher {}: growing read buffer {buf_len} -> {need}",
                        self.name
                    );
                    // A source that never reports more than it was given
                    // would spin; force progress.
                    buf_len = need.max(buf_len.saturating_add(1));
                }
                Err(ReadError::EndOfLog) => return Ok(None),
                Err(ReadError::Source(e)) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventwatch_eventlog::{MemoryAppender, MemorySource};

    fn watcher_over_memory(
        config: SourceConfig,
    ) -> (
        EventWatcher,
        MemoryAppender,
        mpsc::Receiver<EventEntry>,
    ) {
        let (source, appender) = MemorySource::new();
        let (tx, rx) = mpsc::channel(1);
        let watcher =
            EventWatcher::init(config, Box::new(source), CancellationToken::new(), tx).unwrap();
        (watcher, appender, rx)
    }

    #[tokio::test]
    async fn test_init_records_current_end_position() {
        let (source, appender) = MemorySource::new();
        appender.append(b"already there");
        let (tx, _rx) = mpsc::channel(1);

        let watcher = EventWatcher::init(
            SourceConfig::memory("synth"),
            Box::new(source),
            CancellationToken::new(),
            tx,
        )
        .unwrap();
        assert_eq!(watcher.cursor, 13);
    }

    #[tokio::test]
    async fn test_read_grows_to_reported_size() {
        let (mut watcher, appender, _rx) =
            watcher_over_memory(SourceConfig::memory("synth").with_read_buffer_size(8));
        appender.append(&[7u8; 300]);

        let payload = watcher.read_from(0).unwrap().unwrap();
        assert_eq!(payload.len(), 300);
    }

    #[tokio::test]
    async fn test_read_at_end_is_benign() {
        let (mut watcher, appender, _rx) = watcher_over_memory(SourceConfig::memory("synth"));
        appender.append(b"xy");

        assert!(watcher.read_from(2).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_preempts_the_wait() {
        let (watcher, _appender, _rx) = watcher_over_memory(SourceConfig::memory("synth"));
        let cancel = watcher.cancel.clone();

        let loop_task = tokio::spawn(watcher.listen());
        tokio::task::yield_now().await;
        cancel.cancel();

        tokio::time::timeout(std::time::Duration::from_secs(1), loop_task)
            .await
            .expect("loop did not observe cancellation")
            .unwrap();
    }
}
