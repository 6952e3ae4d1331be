//! The watch registry.
//!
//! `EventNotifier` owns the set of named watchers and the single shared
//! output stream. The one invariant everything here serves: the stream
//! closes only after every watcher loop has fully exited, so a push onto a
//! closed channel cannot happen. Shutdown is therefore strictly "stop
//! producers, wait for producers, then close": the channel closes when
//! the last sender clone (held by the last exiting watcher task, then by
//! the notifier itself) is dropped.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

use eventwatch_eventlog::{EventLogSource, FileSource, MemorySource, SourceHandle};

use crate::config::{SourceConfig, SourceKind};
use crate::entry::EventEntry;
use crate::error::{NotifierError, Result};
use crate::watcher::EventWatcher;

/// Registry of named source watchers multiplexed onto one stream.
pub struct EventNotifier {
    watchers: Mutex<HashMap<String, WatcherHandle>>,
    tx: mpsc::Sender<EventEntry>,
    tracker: TaskTracker,
    cancel: CancellationToken,
}

impl EventNotifier {
    /// Create a notifier and the receiving end of its stream.
    ///
    /// The channel is bounded: a send blocks the producing watcher when the
    /// consumer has not drained `capacity` pending entries (clamped to at
    /// least 1). No ordering holds across sources; per source, entries
    /// arrive in append order.
    pub fn new(capacity: usize) -> (EventNotifier, mpsc::Receiver<EventEntry>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            EventNotifier {
                watchers: Mutex::new(HashMap::new()),
                tx,
                tracker: TaskTracker::new(),
                cancel: CancellationToken::new(),
            },
            rx,
        )
    }

    /// Add a watcher for the source described by `config`.
    ///
    /// Fails with [`NotifierError::DuplicateSource`] without side effects
    /// if the name is taken, and with [`NotifierError::Init`] if the source
    /// cannot be opened, in which case the name stays unregistered. On
    /// success the watcher's loop is already running; this does not wait
    /// for it to reach its first wait point.
    pub fn add_watcher(&self, config: SourceConfig) -> Result<()> {
        self.ensure_absent(&config.name)?;
        let source: Box<dyn EventLogSource> = match &config.kind {
            SourceKind::File { path } => Box::new(FileSource::open(path)?),
            SourceKind::Memory => Box::new(MemorySource::new().0),
        };
        self.add_source(config, source)
    }

    /// Add a watcher over a caller-supplied source.
    ///
    /// This is the seam native event log integrations plug into: implement
    /// [`EventLogSource`] and hand it here; `config.kind` is not consulted.
    pub fn add_source(&self, config: SourceConfig, source: Box<dyn EventLogSource>) -> Result<()> {
        let name = config.name.clone();
        self.ensure_absent(&name)?;

        let cancel = self.cancel.child_token();
        let watcher = EventWatcher::init(config, source, cancel.clone(), self.tx.clone())?;
        let handle = WatcherHandle {
            name: name.clone(),
            source_handle: watcher.source_handle(),
            cancel,
        };

        {
            let mut watchers = lock(&self.watchers);
            if watchers.contains_key(&name) {
                return Err(NotifierError::DuplicateSource(name));
            }
            watchers.insert(name.clone(), handle);
        }
        self.tracker.spawn(watcher.listen());
        info!("added watcher {name}");
        Ok(())
    }

    /// Request a watcher's shutdown and drop it from the registry.
    ///
    /// Returns without waiting for the loop to exit; the loop observes
    /// cancellation at its next wait point. Sibling watchers are untouched.
    pub fn remove_watcher(&self, name: &str) -> Result<()> {
        let handle = lock(&self.watchers)
            .remove(name)
            .ok_or_else(|| NotifierError::SourceNotFound(name.to_string()))?;
        handle.close();
        info!("removed watcher {name}");
        Ok(())
    }

    /// Look up a watcher by name. Read-only; lifecycle is untouched.
    pub fn get(&self, name: &str) -> Result<WatcherHandle> {
        lock(&self.watchers)
            .get(name)
            .cloned()
            .ok_or_else(|| NotifierError::SourceNotFound(name.to_string()))
    }

    /// Number of registered watchers.
    pub fn len(&self) -> usize {
        lock(&self.watchers).len()
    }

    /// Whether no watchers are registered.
    pub fn is_empty(&self) -> bool {
        lock(&self.watchers).is_empty()
    }

    /// Shut everything down: cancel every watcher, wait for every loop to
    /// exit, then let the stream close.
    ///
    /// Consumes the notifier; when this returns, the receiver drains any
    /// remaining buffered entries and then yields `None`. The wait is what
    /// makes a send on a closed channel structurally impossible.
    pub async fn close(self) {
        self.cancel.cancel();
        lock(&self.watchers).clear();
        self.tracker.close();
        self.tracker.wait().await;
        info!("event notifier closed");
        // `self.tx` drops here; every watcher clone is already gone.
    }

    fn ensure_absent(&self, name: &str) -> Result<()> {
        if lock(&self.watchers).contains_key(name) {
            return Err(NotifierError::DuplicateSource(name.to_string()));
        }
        Ok(())
    }
}

/// What the registry stores and [`EventNotifier::get`] returns: the
/// watcher's identity plus its cancellation side.
///
/// The watcher itself (source, cursor, signals) lives inside its loop task
/// and is never shared.
#[derive(Clone)]
pub struct WatcherHandle {
    name: String,
    source_handle: SourceHandle,
    cancel: CancellationToken,
}

impl WatcherHandle {
    /// Name of the watched source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Opaque handle of the native resource behind the source.
    pub fn source_handle(&self) -> SourceHandle {
        self.source_handle
    }

    /// Request this watcher's shutdown. Idempotent, callable from any task.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Whether shutdown has been requested.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Map lock is held for bookkeeping only, never across source I/O or a
/// channel send.
fn lock(
    watchers: &Mutex<HashMap<String, WatcherHandle>>,
) -> std::sync::MutexGuard<'_, HashMap<String, WatcherHandle>> {
    watchers
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
