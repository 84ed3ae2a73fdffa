use super::{write_entry, Entry};
use crate::router::NamedRoutes;
use crate::template::TemplateManager;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};

/// Application-wide keyed values.
///
/// Values are written while the router is being built (by the builder and by middleware
/// `initialize` hooks) and the store is frozen inside the [`AppState`] afterwards, so
/// concurrent requests only ever read it.
#[derive(Default)]
pub struct GlobalData {
    entries: HashMap<String, Entry>,
}

impl GlobalData {
    pub fn new() -> GlobalData {
        GlobalData::default()
    }

    /// Stores a value. Returns `false` when the key is held by a read-only entry.
    pub fn insert<K, V>(&mut self, key: K, value: V, read_only: bool) -> bool
    where
        K: Into<String>,
        V: Any + Send + Sync,
    {
        write_entry(&mut self.entries, key.into(), Entry::new(value, read_only))
    }

    pub fn get<V: Any>(&self, key: &str) -> Option<&V> {
        self.entries.get(key).and_then(|entry| entry.value.downcast_ref::<V>())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Debug for GlobalData {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut keys = self.entries.keys().collect::<Vec<_>>();
        keys.sort();
        f.debug_struct("GlobalData").field("keys", &keys).finish()
    }
}

/// The application context shared by every request once the router is built.
///
/// It carries the named-route table used for reverse URLs, the template manager and the
/// global data. Request handlers reach it through
/// [`RequestExt::app_state`](./ext/trait.RequestExt.html#tymethod.app_state) and controllers
/// through their base.
#[derive(Debug)]
pub struct AppState {
    pub(crate) routes: NamedRoutes,
    pub(crate) templates: TemplateManager,
    pub(crate) globals: GlobalData,
}

impl AppState {
    pub(crate) fn new(routes: NamedRoutes, templates: TemplateManager, globals: GlobalData) -> AppState {
        AppState {
            routes,
            templates,
            globals,
        }
    }

    pub fn routes(&self) -> &NamedRoutes {
        &self.routes
    }

    pub fn templates(&self) -> &TemplateManager {
        &self.templates
    }

    pub fn globals(&self) -> &GlobalData {
        &self.globals
    }

    /// Shorthand for [`NamedRoutes::reverse_url`].
    pub fn reverse_url<I, A>(&self, name: &str, args: I) -> String
    where
        I: IntoIterator<Item = A>,
        A: ToString,
    {
        self.routes.reverse_url(name, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_keep_first_read_only_global() {
        let mut globals = GlobalData::new();
        assert!(globals.insert("baz", "bar", true));
        assert!(!globals.insert("baz", "foo", true));
        assert_eq!(globals.get::<&str>("baz"), Some(&"bar"));
    }

    #[test]
    fn should_report_missing_globals() {
        let mut globals = GlobalData::new();
        globals.insert("key", 1_usize, false);
        assert!(globals.contains("key"));
        assert_eq!(globals.get::<usize>("invalid"), None);
        assert_eq!(globals.get::<String>("key"), None);
        assert_eq!(globals.len(), 1);
    }
}
