// Remembered entries, kept as one JSON array in the preference store.

use async_trait::async_trait;
use futures::lock::Mutex;
use serde_json::Value;

use crate::entry::{RememberedEntry, VaultEntry};
use crate::error::{BridgeError, Result};

/// Async key/value storage (`storage.local` in the browser).
#[async_trait(?Send)]
pub trait PreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Read-modify-write access to the remembered list.
///
/// Toggles go through `queue`, one at a time, so two toggles from the same popup
/// never read the same snapshot.
pub struct RememberedEntries<S> {
    store: S,
    key: String,
    queue: Mutex<()>,
}

impl<S: PreferenceStore> RememberedEntries<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            queue: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All remembered entries. Writes an empty list first if the key is missing.
    pub async fn load(&self) -> Result<Vec<RememberedEntry>> {
        match self.store.get(&self.key).await? {
            Some(value) => decode(value),
            None => {
                log::debug!("Stored '{}' does not exist yet. Creating...", self.key);
                self.store.set(&self.key, Value::Array(Vec::new())).await?;
                match self.store.get(&self.key).await? {
                    Some(value) => decode(value),
                    None => Ok(Vec::new()),
                }
            }
        }
    }

    /// Append on check (once per name), remove every entry with that name on uncheck.
    pub async fn toggle(&self, entry: &VaultEntry, checked: bool) -> Result<Vec<RememberedEntry>> {
        let _turn = self.queue.lock().await;
        log::debug!("Handling stored entry {}: {}", entry.name, checked);

        let mut entries = self.load().await?;
        if checked {
            if !entries.iter().any(|e| e.name == entry.name) {
                entries.push(entry.remembered());
            }
        } else {
            entries.retain(|e| e.name != entry.name);
        }

        let value = serde_json::to_value(&entries)
            .map_err(|e| BridgeError::Storage(format!("Serialization error: {}", e)))?;
        self.store.set(&self.key, value).await?;
        Ok(entries)
    }
}

fn decode(value: Value) -> Result<Vec<RememberedEntry>> {
    serde_json::from_value(value).map_err(|e| BridgeError::Storage(format!("Parse error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemoryStore;
    use serde_json::json;

    fn remembered() -> RememberedEntries<MemoryStore> {
        RememberedEntries::new(MemoryStore::default(), "entries")
    }

    #[tokio::test]
    async fn test_load_bootstraps_missing_key() {
        let entries = remembered();
        assert!(entries.load().await.unwrap().is_empty());
        assert_eq!(entries.store().raw("entries"), Some(json!([])));
    }

    #[tokio::test]
    async fn test_check_uncheck_check_keeps_single_entry() {
        let entries = remembered();
        let site = VaultEntry::new("Site A", "bob");

        entries.toggle(&site, true).await.unwrap();
        entries.toggle(&site, false).await.unwrap();
        entries.toggle(&site, true).await.unwrap();
        entries.toggle(&site, true).await.unwrap();

        let stored = entries.load().await.unwrap();
        assert_eq!(stored.iter().filter(|e| e.name == "Site A").count(), 1);
    }

    #[tokio::test]
    async fn test_uncheck_removes_all_duplicates_by_name() {
        let store = MemoryStore::default();
        store.put(
            "entries",
            json!([
                {"name": "Site A", "user": "bob"},
                {"name": "Site A", "user": "bob"},
                {"name": "Site B", "user": "eve"}
            ]),
        );
        let entries = RememberedEntries::new(store, "entries");

        let left = entries
            .toggle(&VaultEntry::new("Site A", "bob"), false)
            .await
            .unwrap();
        assert_eq!(left, vec![RememberedEntry { name: "Site B".into(), user: "eve".into() }]);
    }

    #[tokio::test]
    async fn test_concurrent_toggles_do_not_lose_updates() {
        let entries = remembered();
        let a = VaultEntry::new("A", "u1");
        let b = VaultEntry::new("B", "u2");

        let (ra, rb) = futures::join!(entries.toggle(&a, true), entries.toggle(&b, true));
        ra.unwrap();
        rb.unwrap();

        let names: Vec<_> = entries.load().await.unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_corrupt_value_is_storage_error() {
        let store = MemoryStore::default();
        store.put("entries", json!("not a list"));
        let entries = RememberedEntries::new(store, "entries");
        assert!(matches!(entries.load().await, Err(BridgeError::Storage(_))));
    }
}
