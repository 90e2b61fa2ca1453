//! Event callbacks, keyed by event name.
//!
//! Dispatch takes a snapshot of the matching handlers under the lock and
//! invokes them after releasing it, so a handler may register or remove
//! callbacks (including itself) without deadlocking. One-shot handlers are
//! removed while the snapshot is taken, which makes them fire at most once
//! even when two dispatches race.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gamelink_protocol::{Event, Origin};

/// Handle returned when registering a callback.
///
/// Unique within the registry that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

impl CallbackId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cb-{}", self.0)
    }
}

/// A registered event callback.
pub type EventHandler = Arc<dyn Fn(&Origin, &Event) + Send + Sync>;

struct Entry {
    id: CallbackId,
    handler: EventHandler,
    once: bool,
    builtin: bool,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    by_name: HashMap<String, Vec<Entry>>,
}

impl Inner {
    fn insert(
        &mut self,
        name: &str,
        handler: EventHandler,
        once: bool,
        builtin: bool,
    ) -> CallbackId {
        self.next_id += 1;
        let id = CallbackId(self.next_id);
        self.by_name.entry(name.to_owned()).or_default().push(Entry {
            id,
            handler,
            once,
            builtin,
        });
        id
    }
}

/// Maps event names to the callbacks registered for them.
#[derive(Default)]
pub struct CallbackRegistry {
    inner: Mutex<Inner>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every event named `name`.
    pub fn on<F>(&self, name: &str, handler: F) -> CallbackId
    where
        F: Fn(&Origin, &Event) + Send + Sync + 'static,
    {
        self.lock().insert(name, Arc::new(handler), false, false)
    }

    /// Registers `handler` for the next event named `name` only.
    pub fn once<F>(&self, name: &str, handler: F) -> CallbackId
    where
        F: Fn(&Origin, &Event) + Send + Sync + 'static,
    {
        self.lock().insert(name, Arc::new(handler), true, false)
    }

    /// Registers a runtime-owned handler that survives
    /// [`clear_non_builtin`](Self::clear_non_builtin).
    pub(crate) fn register_builtin<F>(&self, name: &str, handler: F) -> CallbackId
    where
        F: Fn(&Origin, &Event) + Send + Sync + 'static,
    {
        self.lock().insert(name, Arc::new(handler), false, true)
    }

    /// Removes the callback `id`. Returns `false` if it was not registered;
    /// removing twice is harmless.
    pub fn remove(&self, id: CallbackId) -> bool {
        let mut inner = self.lock();
        let mut removed = false;
        inner.by_name.retain(|_, entries| {
            let before = entries.len();
            entries.retain(|entry| entry.id != id);
            removed |= entries.len() != before;
            !entries.is_empty()
        });
        removed
    }

    /// Invokes every callback registered for `event.name`. Returns how many
    /// ran.
    pub fn dispatch(&self, origin: &Origin, event: &Event) -> usize {
        let handlers: Vec<EventHandler> = {
            let mut inner = self.lock();
            let Some(entries) = inner.by_name.get_mut(&event.name) else {
                return 0;
            };
            let handlers = entries.iter().map(|e| Arc::clone(&e.handler)).collect();
            entries.retain(|e| !e.once);
            if entries.is_empty() {
                inner.by_name.remove(&event.name);
            }
            handlers
        };

        for handler in &handlers {
            handler(origin, event);
        }
        handlers.len()
    }

    /// Drops every callback the application registered, keeping the
    /// runtime's own.
    pub fn clear_non_builtin(&self) {
        self.lock().by_name.retain(|_, entries| {
            entries.retain(|entry| entry.builtin);
            !entries.is_empty()
        });
    }

    /// Number of callbacks registered for `name`.
    pub fn handler_count(&self, name: &str) -> usize {
        self.lock().by_name.get(name).map_or(0, Vec::len)
    }

    /// Total number of registered callbacks.
    pub fn len(&self) -> usize {
        self.lock().by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callbacks", &self.len())
            .finish()
    }
}
