//! Client-side mirror of a server-owned key-value map.
//!
//! Local mutations apply to the cache immediately (optimistic writes) and
//! are handed to the transport; remote operations arrive asynchronously and
//! land in the same cache through the same mutation path. The registered
//! update listener fires exactly once per operation, local or remote, so a
//! renderer never has to care where a change came from.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::Error;
use crate::protocol::SyncOperation;
use crate::transport::{SocketTransport, SseTransport, Transport};

/// Shared cache state, owned by the map handle and the transport tasks.
pub(crate) struct MapState {
    entries: Mutex<HashMap<String, String>>,
    online: AtomicBool,
    listener: Box<dyn Fn() + Send + Sync>,
}

impl MapState {
    pub(crate) fn new(listener: Box<dyn Fn() + Send + Sync>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            online: AtomicBool::new(false),
            listener,
        }
    }

    /// Single mutation path shared by local and remote operations.
    fn apply(&self, operation: &SyncOperation) {
        let mut entries = self.entries.lock().unwrap();
        match operation {
            SyncOperation::Init { map } => *entries = map.clone(),
            SyncOperation::Put { key, value } => {
                entries.insert(key.clone(), value.clone());
            }
            SyncOperation::Remove { key } => {
                entries.remove(key);
            }
            SyncOperation::Clear => entries.clear(),
            SyncOperation::Unknown => {}
        }
    }

    /// Apply a remote-origin operation and notify the listener.
    ///
    /// Unrecognized event tags leave the cache untouched; the listener still
    /// fires, matching the outbound path.
    pub(crate) fn dispatch_remote(&self, operation: SyncOperation) {
        if let SyncOperation::Unknown = operation {
            log::debug!("[Collection] Ignoring unrecognized event");
        } else {
            log::debug!("[Collection] Applying remote {}", operation.event_name());
            self.apply(&operation);
        }
        self.notify();
    }

    fn notify(&self) {
        (self.listener)();
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub(crate) fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

fn validate_key(key: &str) -> Result<(), Error> {
    if key.is_empty() {
        return Err(Error::InvalidKey);
    }
    Ok(())
}

/// A map-like view over server state that is actually updated
/// asynchronously.
///
/// Construct with [`SharedMap::over_websocket`] for a duplex connection or
/// [`SharedMap::over_event_stream`] for push-only environments. The update
/// listener runs on the transport's reader task for remote operations and on
/// the calling thread for local ones; use a channel to hand notifications to
/// a render loop.
pub struct SharedMap {
    state: Arc<MapState>,
    transport: Box<dyn Transport>,
}

impl SharedMap {
    /// Mirror the collection over a single bidirectional WebSocket
    /// connection.
    pub async fn over_websocket<F>(url: &str, listener: F) -> Result<Self, Error>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let state = Arc::new(MapState::new(Box::new(listener)));
        let transport = SocketTransport::connect(url, state.clone()).await?;
        Ok(Self {
            state,
            transport: Box::new(transport),
        })
    }

    /// Mirror the collection over a one-way server-sent-events stream, with
    /// local edits posted to the same resource.
    pub async fn over_event_stream<F>(url: &str, listener: F) -> Result<Self, Error>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let state = Arc::new(MapState::new(Box::new(listener)));
        let transport = SseTransport::connect(url, state.clone()).await?;
        Ok(Self {
            state,
            transport: Box::new(transport),
        })
    }

    /// Wire the map to a custom outbound transport. Inbound operations are
    /// fed through [`apply_remote`](SharedMap::apply_remote); the map starts
    /// offline and empty.
    pub fn with_transport<T, F>(transport: T, listener: F) -> Self
    where
        T: Transport + 'static,
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            state: Arc::new(MapState::new(Box::new(listener))),
            transport: Box::new(transport),
        }
    }

    /// Feed a remote-origin operation into the cache, exactly as the
    /// transport reader tasks do.
    pub fn apply_remote(&self, operation: SyncOperation) {
        self.state.dispatch_remote(operation);
    }

    /// Value for `key`, or `None` when there is no such entry.
    pub fn get(&self, key: &str) -> Result<Option<String>, Error> {
        validate_key(key)?;
        Ok(self.state.entries.lock().unwrap().get(key).cloned())
    }

    /// Put an entry, optimistically: the cache updates before the operation
    /// reaches the server, and the listener fires even if the transmission
    /// was dropped while offline.
    pub fn put(&self, key: &str, value: impl Into<String>) -> Result<(), Error> {
        validate_key(key)?;
        let operation = SyncOperation::Put {
            key: key.to_owned(),
            value: value.into(),
        };
        self.state.apply(&operation);
        self.transport.send(&operation);
        self.state.notify();
        Ok(())
    }

    /// Remove an entry, with the same optimistic-local-then-transmit pattern
    /// as [`put`](SharedMap::put). Removing an absent key is not an error.
    pub fn remove(&self, key: &str) -> Result<(), Error> {
        validate_key(key)?;
        let operation = SyncOperation::Remove {
            key: key.to_owned(),
        };
        self.state.apply(&operation);
        self.transport.send(&operation);
        self.state.notify();
        Ok(())
    }

    /// Reset the collection to empty.
    pub fn clear(&self) {
        let operation = SyncOperation::Clear;
        self.state.apply(&operation);
        self.transport.send(&operation);
        self.state.notify();
    }

    pub fn size(&self) -> usize {
        self.state.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn contains_key(&self, key: &str) -> Result<bool, Error> {
        validate_key(key)?;
        Ok(self.state.entries.lock().unwrap().contains_key(key))
    }

    /// Snapshot of the current keys. A fresh collection, not a live view.
    pub fn key_set(&self) -> Vec<String> {
        self.state.entries.lock().unwrap().keys().cloned().collect()
    }

    /// Snapshot of the current values.
    pub fn values(&self) -> Vec<String> {
        self.state
            .entries
            .lock()
            .unwrap()
            .values()
            .cloned()
            .collect()
    }

    /// Whether the inbound channel is currently connected.
    pub fn is_online(&self) -> bool {
        self.state.is_online()
    }
}
