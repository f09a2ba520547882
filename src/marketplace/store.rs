//! Document storage for marketplace entities

use crate::error::Result;
use crate::storage::{JsonStorage, StorageBackend};
use crate::sync::RwLockExt;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

/// Storage abstraction for documents addressed by numeric id
///
/// Ids are assigned by the store, start at 1 and are never reused.
pub trait DocumentStore: Send + Sync {
    /// Store a new document and return its id
    fn insert(&self, document: Value) -> Result<u64>;

    /// Get a document by id
    fn get(&self, id: u64) -> Result<Option<Value>>;

    /// Replace an existing document; returns `false` if there was none
    fn replace(&self, id: u64, document: Value) -> Result<bool>;

    /// Remove a document, returning it if it existed
    fn remove(&self, id: u64) -> Result<Option<Value>>;

    /// All ids, ascending
    fn ids(&self) -> Result<Vec<u64>>;

    /// Backend name, for logs
    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentTable {
    next_id: u64,
    #[serde(default, with = "id_keys")]
    documents: BTreeMap<u64, Value>,
}

impl Default for DocumentTable {
    fn default() -> Self {
        Self {
            next_id: 1,
            documents: BTreeMap::new(),
        }
    }
}

impl DocumentTable {
    fn insert(&mut self, document: Value) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.documents.insert(id, document);
        id
    }

    fn replace(&mut self, id: u64, document: Value) -> bool {
        match self.documents.get_mut(&id) {
            Some(slot) => {
                *slot = document;
                true
            }
            None => false,
        }
    }
}

/// Ids as string keys, so formats with string-only keys (TOML) can hold the table
mod id_keys {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        documents: &BTreeMap<u64, Value>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(documents.iter().map(|(id, doc)| (id.to_string(), doc)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<u64, Value>, D::Error> {
        BTreeMap::<String, Value>::deserialize(deserializer)?
            .into_iter()
            .map(|(id, doc)| {
                id.parse::<u64>()
                    .map(|id| (id, doc))
                    .map_err(|_| D::Error::custom(format!("invalid document id '{id}'")))
            })
            .collect()
    }
}

// =============================================================================
// Memory store
// =============================================================================

/// In-memory document store (not persisted)
#[derive(Default)]
pub struct MemoryDocumentStore {
    table: RwLock<DocumentTable>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn insert(&self, document: Value) -> Result<u64> {
        Ok(self.table.write_recovered().insert(document))
    }

    fn get(&self, id: u64) -> Result<Option<Value>> {
        Ok(self.table.read_recovered().documents.get(&id).cloned())
    }

    fn replace(&self, id: u64, document: Value) -> Result<bool> {
        Ok(self.table.write_recovered().replace(id, document))
    }

    fn remove(&self, id: u64) -> Result<Option<Value>> {
        Ok(self.table.write_recovered().documents.remove(&id))
    }

    fn ids(&self) -> Result<Vec<u64>> {
        Ok(self.table.read_recovered().documents.keys().copied().collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

// =============================================================================
// Single-file store
// =============================================================================

/// All documents of one collection in a single file, cached after first load
pub struct FileDocumentStore<S: StorageBackend = JsonStorage> {
    path: PathBuf,
    storage: S,
    cache: RwLock<Option<DocumentTable>>,
}

impl<S: StorageBackend> FileDocumentStore<S> {
    /// Store documents of `collection` in `{dir}/{collection}.{ext}`
    pub fn new(dir: impl Into<PathBuf>, collection: &str, storage: S) -> Self {
        let path = dir
            .into()
            .join(format!("{collection}.{}", storage.extension()));
        Self {
            path,
            storage,
            cache: RwLock::new(None),
        }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Drop the cached table; the next access re-reads the file
    pub fn invalidate_cache(&self) {
        *self.cache.write_recovered() = None;
    }

    fn load(&self) -> Result<DocumentTable> {
        let table = self
            .storage
            .read_optional::<DocumentTable>(&self.path)?
            .unwrap_or_default();
        debug!(
            "Loaded {} document(s) from {}",
            table.documents.len(),
            self.path.display()
        );
        Ok(table)
    }

    fn read<T>(&self, f: impl FnOnce(&DocumentTable) -> T) -> Result<T> {
        if let Some(table) = self.cache.read_recovered().as_ref() {
            return Ok(f(table));
        }
        let mut cache = self.cache.write_recovered();
        if cache.is_none() {
            *cache = Some(self.load()?);
        }
        Ok(f(cache.get_or_insert_with(DocumentTable::default)))
    }

    /// Apply `f` and write the table back if it reports a change
    fn modify<T>(&self, f: impl FnOnce(&mut DocumentTable) -> (T, bool)) -> Result<T> {
        let mut cache = self.cache.write_recovered();
        let mut table = match cache.take() {
            Some(table) => table,
            None => self.load()?,
        };

        let (result, changed) = f(&mut table);
        // On a failed write the cache stays empty and the file is re-read next time.
        if changed {
            self.storage.write(&self.path, &table)?;
        }
        *cache = Some(table);
        Ok(result)
    }
}

impl<S: StorageBackend> DocumentStore for FileDocumentStore<S> {
    fn insert(&self, document: Value) -> Result<u64> {
        self.modify(|table| (table.insert(document), true))
    }

    fn get(&self, id: u64) -> Result<Option<Value>> {
        self.read(|table| table.documents.get(&id).cloned())
    }

    fn replace(&self, id: u64, document: Value) -> Result<bool> {
        self.modify(|table| {
            let replaced = table.replace(id, document);
            (replaced, replaced)
        })
    }

    fn remove(&self, id: u64) -> Result<Option<Value>> {
        self.modify(|table| {
            let removed = table.documents.remove(&id);
            let changed = removed.is_some();
            (removed, changed)
        })
    }

    fn ids(&self) -> Result<Vec<u64>> {
        self.read(|table| table.documents.keys().copied().collect())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn exercise(store: &dyn DocumentStore) {
        let first = store.insert(json!({ "price": "5" })).unwrap();
        let second = store.insert(json!({ "price": "7" })).unwrap();
        assert_eq!((first, second), (1, 2));

        assert_eq!(store.get(first).unwrap(), Some(json!({ "price": "5" })));
        assert!(store.replace(first, json!({ "price": "10" })).unwrap());
        assert!(!store.replace(99, json!({})).unwrap());
        assert_eq!(store.get(first).unwrap(), Some(json!({ "price": "10" })));

        assert!(store.remove(first).unwrap().is_some());
        assert!(store.remove(first).unwrap().is_none());
        assert_eq!(store.get(first).unwrap(), None);

        // ids are not reused after a delete
        let third = store.insert(json!({})).unwrap();
        assert_eq!(third, 3);
        assert_eq!(store.ids().unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryDocumentStore::new());
    }

    #[test]
    fn test_file_store() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::new(dir.path(), "products", JsonStorage::new());
        exercise(&store);
        assert!(store.path().exists());
    }

    #[test]
    fn test_file_store_reload() {
        let dir = tempdir().unwrap();
        {
            let store = FileDocumentStore::new(dir.path(), "products", JsonStorage::compact());
            store.insert(json!({ "price": "5" })).unwrap();
            store.insert(json!({ "price": "6" })).unwrap();
            store.remove(2).unwrap();
        }

        let store = FileDocumentStore::new(dir.path(), "products", JsonStorage::compact());
        assert_eq!(store.ids().unwrap(), vec![1]);
        assert_eq!(store.insert(json!({})).unwrap(), 3);
    }

    #[test]
    fn test_invalidate_cache_rereads_file() {
        let dir = tempdir().unwrap();
        let store = FileDocumentStore::new(dir.path(), "products", JsonStorage::new());
        store.insert(json!({ "price": "5" })).unwrap();

        let other = FileDocumentStore::new(dir.path(), "products", JsonStorage::new());
        other.insert(json!({ "price": "6" })).unwrap();

        assert_eq!(store.ids().unwrap(), vec![1]);
        store.invalidate_cache();
        assert_eq!(store.ids().unwrap(), vec![1, 2]);
    }
}
