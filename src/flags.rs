//! Session flags
//!
//! Two session-scoped flags survive a full page load and steer the boot
//! protocol. In the browser they live in `sessionStorage`; natively and in
//! tests they live in a [`MemoryFlagStore`].

use std::collections::HashMap;

/// Set by the previous page right before it navigates away; consumed once on boot
pub const NAVIGATION_PENDING: &str = "navigationPreloader";

/// Set once this browser session has completed a page load; never cleared
pub const APP_LOADED: &str = "app_loaded";

/// Session-scoped string key/value storage
pub trait FlagStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Read a flag and delete it
    fn take(&mut self, key: &str) -> Option<String> {
        let value = self.get(key)?;
        self.remove(key);
        Some(value)
    }
}

/// Leave the navigation marker so the next page shows its overlay immediately
pub fn mark_navigation_pending<F: FlagStore + ?Sized>(store: &mut F) {
    store.set(NAVIGATION_PENDING, "true");
}

/// In-memory flag store
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryFlagStore {
    entries: HashMap<String, String>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated as if the session had already loaded a page
    pub fn returning_session() -> Self {
        let mut store = Self::new();
        store.set(APP_LOADED, "true");
        store
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}
