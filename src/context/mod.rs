//! Request-scoped and application-wide keyed storage.
//!
//! A [`RequestContext`] is created by the request service for every inbound request, travels
//! in the request extensions through the middleware chain into the handler and is cleared when
//! the response has been produced. Entries may be stored read-only: once a key holds a read-only
//! value, further writes to that key are ignored until the context is cleared.

use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

pub use self::global::{AppState, GlobalData};

mod global;

pub(crate) struct Entry {
    value: Box<dyn Any + Send + Sync>,
    read_only: bool,
}

impl Entry {
    pub(crate) fn new<V: Any + Send + Sync>(value: V, read_only: bool) -> Entry {
        Entry {
            value: Box::new(value),
            read_only,
        }
    }
}

/// Stores `entry` under `key` unless a read-only entry already occupies it.
pub(crate) fn write_entry(map: &mut HashMap<String, Entry>, key: String, entry: Entry) -> bool {
    match map.get(&key) {
        Some(existing) if existing.read_only => false,
        _ => {
            map.insert(key, entry);
            true
        }
    }
}

/// The per-request keyed store.
///
/// Cloning a `RequestContext` yields another handle to the same entries, so middleware, the
/// router and the handler of one request all observe the same data. Two requests never share
/// a context.
///
/// # Examples
///
/// ```
/// use routekit::RequestContext;
///
/// let ctx = RequestContext::new();
/// ctx.set_read_only("user_id", 7_u64);
/// ctx.set("user_id", 8_u64);
///
/// assert_eq!(ctx.get::<u64>("user_id"), Some(7));
///
/// ctx.clear();
/// assert!(!ctx.contains("user_id"));
/// ```
#[derive(Clone, Default)]
pub struct RequestContext {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
}

impl RequestContext {
    pub fn new() -> RequestContext {
        RequestContext::default()
    }

    /// Stores a writable value. Returns `false` if the key is held by a read-only entry.
    pub fn set<K, V>(&self, key: K, value: V) -> bool
    where
        K: Into<String>,
        V: Any + Send + Sync,
    {
        self.insert(key, value, false)
    }

    /// Stores a value which can't be overwritten for the rest of the request.
    pub fn set_read_only<K, V>(&self, key: K, value: V) -> bool
    where
        K: Into<String>,
        V: Any + Send + Sync,
    {
        self.insert(key, value, true)
    }

    /// Stores a value with an explicit read-only flag.
    ///
    /// The write is silently dropped (and `false` returned) when the key already holds a
    /// read-only value.
    pub fn insert<K, V>(&self, key: K, value: V, read_only: bool) -> bool
    where
        K: Into<String>,
        V: Any + Send + Sync,
    {
        write_entry(&mut self.inner.lock(), key.into(), Entry::new(value, read_only))
    }

    /// Returns a clone of the value stored under `key` if it exists and has type `V`.
    pub fn get<V: Any + Clone>(&self, key: &str) -> Option<V> {
        self.inner
            .lock()
            .get(key)
            .and_then(|entry| entry.value.downcast_ref::<V>())
            .cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains_key(key)
    }

    pub fn is_read_only(&self, key: &str) -> bool {
        self.inner.lock().get(key).map(|entry| entry.read_only).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Removes every entry of this request, read-only ones included.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl Debug for RequestContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let map = self.inner.lock();
        let mut keys = map.keys().collect::<Vec<_>>();
        keys.sort();
        f.debug_struct("RequestContext").field("keys", &keys).finish()
    }
}
