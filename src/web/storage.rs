//! `sessionStorage`-backed flags

use web_sys::Storage;

use crate::flags::FlagStore;

pub struct SessionFlagStore {
    storage: Storage,
}

impl SessionFlagStore {
    /// `None` when the browser denies storage access (privacy modes, sandboxed iframes)
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.session_storage().ok().flatten()?;
        Some(Self { storage })
    }
}

impl FlagStore for SessionFlagStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) {
        if let Err(err) = self.storage.set_item(key, value) {
            log::warn!("sessionStorage.setItem({key}) failed: {err:?}");
        }
    }

    fn remove(&mut self, key: &str) {
        if let Err(err) = self.storage.remove_item(key) {
            log::warn!("sessionStorage.removeItem({key}) failed: {err:?}");
        }
    }
}
