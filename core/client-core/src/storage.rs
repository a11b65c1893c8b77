//! Durable local storage for the client core.
//!
//! The browser build kept its credential token and profile-completion flag
//! in localStorage. Here that becomes a small key-value capability so each
//! host picks a backing (file on desktop, memory in tests) and tests inject
//! isolated roots.
//!
//! Writes degrade gracefully: a failed write is logged, never surfaced,
//! because `logout()` clears this store and must not be able to fail.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs_err as fs;

/// Key-value persistence capability. All values are strings, mirroring the
/// localStorage semantics this replaces.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    fn clear(&self);
}

/// In-memory store for tests and embedded hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    fn locked(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.locked().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.locked().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.locked().remove(key);
    }

    fn clear(&self) {
        self.locked().clear();
    }
}

/// File-backed store persisting a flat JSON map.
///
/// Production hosts use [`FileStore::open_default`] which points to
/// `~/.prepstage/session.json`; tests use [`FileStore::open`] with a temp
/// path for isolation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens a store at a custom path, loading any existing content.
    /// A missing file is an empty store; a corrupt one is logged and
    /// treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = load_entries(&path);
        Self {
            path,
            cache: Mutex::new(cache),
        }
    }

    /// Opens the store at the conventional per-user location.
    pub fn open_default() -> Self {
        let home = dirs::home_dir().expect("Could not find home directory");
        Self::open(home.join(".prepstage").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                tracing::warn!(path = %self.path.display(), error = %err, "Failed to create storage directory");
                return;
            }
        }
        let json = match serde_json::to_string_pretty(entries) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to encode storage entries");
                return;
            }
        };
        if let Err(err) = fs::write(&self.path, json) {
            tracing::warn!(path = %self.path.display(), error = %err, "Failed to write storage file");
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.locked().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.locked();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.locked();
        entries.remove(key);
        self.persist(&entries);
    }

    fn clear(&self) {
        let mut entries = self.locked();
        entries.clear();
        self.persist(&entries);
    }
}

fn load_entries(path: &Path) -> BTreeMap<String, String> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => return BTreeMap::new(),
    };
    match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Storage file is corrupt; starting empty");
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::default();
        assert_eq!(store.get("auth_token"), None);

        store.set("auth_token", "tok-1");
        assert_eq!(store.get("auth_token"), Some("tok-1".to_string()));

        store.remove("auth_token");
        assert_eq!(store.get("auth_token"), None);
    }

    #[test]
    fn memory_store_clear_removes_everything() {
        let store = MemoryStore::default();
        store.set("a", "1");
        store.set("b", "2");
        store.clear();
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("session.json");

        let store = FileStore::open(&path);
        store.set("auth_token", "tok-1");
        store.set("profile_complete", "true");
        drop(store);

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("auth_token"), Some("tok-1".to_string()));
        assert_eq!(reopened.get("profile_complete"), Some("true".to_string()));
    }

    #[test]
    fn file_store_clear_empties_the_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("session.json");

        let store = FileStore::open(&path);
        store.set("auth_token", "tok-1");
        store.clear();
        drop(store);

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("auth_token"), None);
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json at all").expect("write garbage");

        let store = FileStore::open(&path);
        assert_eq!(store.get("auth_token"), None);
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileStore::open(dir.path().join("never-written.json"));
        assert_eq!(store.get("anything"), None);
    }
}
