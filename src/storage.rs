//! Storage backends
//!
//! Two layers live here:
//!
//! - [`StorageBackend`]: a serialization format that can read and atomically
//!   write files ([`JsonStorage`], and `TomlStorage` with the `toml` feature).
//! - [`OptionStore`]: the per-section persistence slot the settings manager
//!   talks to. Each section is one opaque record, loaded and saved whole.

use crate::error::{Error, Result};
use log::debug;
use regex::Regex;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::sync::RwLockExt;

static SECTION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid section pattern"));

/// Reject section names that could escape a config directory or collide
/// with another section's file.
///
/// # Errors
///
/// Returns `Error::InvalidSection` when the name is empty or contains
/// characters outside `[A-Za-z0-9_-]`.
pub fn validate_section_name(section: &str) -> Result<()> {
    if SECTION_NAME.is_match(section) {
        Ok(())
    } else {
        Err(Error::InvalidSection(section.to_string()))
    }
}

// =============================================================================
// Serialization formats
// =============================================================================

/// Trait for storage format implementations
pub trait StorageBackend: Clone + Send + Sync {
    /// File extension for this storage format (e.g., "json", "toml")
    fn extension(&self) -> &str;

    /// Serialize data to string
    fn serialize<T: Serialize>(&self, data: &T) -> Result<String>;

    /// Deserialize data from string
    fn deserialize<T: DeserializeOwned>(&self, content: &str) -> Result<T>;

    /// Read and deserialize from file
    fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.deserialize(&content)
    }

    /// Serialize and write to file
    ///
    /// Writes to a sibling temp file, then renames over the target.
    fn write<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let content = self.serialize(data)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let file_name = path.file_name().ok_or_else(|| {
            Error::Config(format!(
                "Invalid path '{}': must have a filename",
                path.display()
            ))
        })?;
        let mut temp_filename = file_name.to_os_string();
        temp_filename.push(".tmp");
        let temp_path = path.with_file_name(temp_filename);

        std::fs::write(&temp_path, &content).map_err(|e| Error::FileWrite {
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, path).map_err(|e| Error::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Read a file, treating a missing file as `None`
    fn read_optional<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        match self.read(path) {
            Ok(v) => Ok(Some(v)),
            Err(Error::FileRead { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// JSON storage format (default)
#[derive(Clone, Default)]
pub struct JsonStorage {
    /// Pretty print JSON output
    pretty: bool,
}

impl JsonStorage {
    /// Create a new JSON storage backend with pretty printing enabled
    #[must_use]
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Create a compact JSON storage (no pretty printing)
    #[must_use]
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl StorageBackend for JsonStorage {
    fn extension(&self) -> &str {
        "json"
    }

    fn serialize<T: Serialize>(&self, data: &T) -> Result<String> {
        if self.pretty {
            serde_json::to_string_pretty(data).map_err(Error::from)
        } else {
            serde_json::to_string(data).map_err(Error::from)
        }
    }

    fn deserialize<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        serde_json::from_str(content).map_err(Error::from)
    }
}

/// TOML storage format
#[cfg(feature = "toml")]
#[derive(Clone, Default)]
pub struct TomlStorage;

#[cfg(feature = "toml")]
impl TomlStorage {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "toml")]
impl StorageBackend for TomlStorage {
    fn extension(&self) -> &str {
        "toml"
    }

    fn serialize<T: Serialize>(&self, data: &T) -> Result<String> {
        toml::to_string_pretty(data).map_err(|e| Error::Parse(e.to_string()))
    }

    fn deserialize<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        toml::from_str(content).map_err(|e| Error::Parse(e.to_string()))
    }
}

// =============================================================================
// Option stores
// =============================================================================

/// Per-section persistence slot
///
/// A section is loaded and saved as one record. Implementations only need to
/// make a single `save` atomic; read-modify-write is serialized by the caller.
pub trait OptionStore: Send + Sync {
    /// Load the persisted record for `section`, `None` if nothing was ever saved
    fn load(&self, section: &str) -> Result<Option<Map<String, Value>>>;

    /// Replace the persisted record for `section`
    fn save(&self, section: &str, values: &Map<String, Value>) -> Result<()>;

    /// Backend name, for logs
    fn backend_name(&self) -> &'static str;
}

/// In-memory option store (not persisted)
pub struct MemoryOptionStore {
    sections: RwLock<HashMap<String, Map<String, Value>>>,
}

impl MemoryOptionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sections: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryOptionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionStore for MemoryOptionStore {
    fn load(&self, section: &str) -> Result<Option<Map<String, Value>>> {
        Ok(self.sections.read_recovered().get(section).cloned())
    }

    fn save(&self, section: &str, values: &Map<String, Value>) -> Result<()> {
        self.sections
            .write_recovered()
            .insert(section.to_string(), values.clone());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// File-backed option store: one file per section, `{dir}/{prefix}{section}.{ext}`
pub struct FileOptionStore<S: StorageBackend = JsonStorage> {
    dir: PathBuf,
    prefix: String,
    storage: S,
}

impl<S: StorageBackend> FileOptionStore<S> {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, storage: S) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            storage,
        }
    }

    /// Path of the file holding `section`
    #[must_use]
    pub fn section_path(&self, section: &str) -> PathBuf {
        self.dir.join(format!(
            "{}{}.{}",
            self.prefix,
            section,
            self.storage.extension()
        ))
    }
}

impl<S: StorageBackend> OptionStore for FileOptionStore<S> {
    fn load(&self, section: &str) -> Result<Option<Map<String, Value>>> {
        validate_section_name(section)?;
        let path = self.section_path(section);
        match self.storage.read_optional::<Value>(&path)? {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(Error::Parse(format!(
                "{}: section record is not an object",
                path.display()
            ))),
        }
    }

    fn save(&self, section: &str, values: &Map<String, Value>) -> Result<()> {
        validate_section_name(section)?;
        let path = self.section_path(section);
        self.storage.write(&path, values)?;
        debug!("Saved section '{section}' to {}", path.display());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_json_serialize_pretty_and_compact() {
        let data = TestData {
            name: "test".into(),
            value: 42,
        };

        let pretty = JsonStorage::new().serialize(&data).unwrap();
        assert!(pretty.contains('\n'));
        assert!(pretty.contains("\"name\": \"test\""));

        let compact = JsonStorage::compact().serialize(&data).unwrap();
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let storage = JsonStorage::new();
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/test.json");

        let data = TestData {
            name: "hello".into(),
            value: 123,
        };
        storage.write(&path, &data).unwrap();

        let loaded: TestData = storage.read(&path).unwrap();
        assert_eq!(data, loaded);
        assert!(!dir.path().join("nested/dir/test.json.tmp").exists());
    }

    #[test]
    fn test_read_optional_missing_file() {
        let dir = tempdir().unwrap();
        let loaded: Option<TestData> = JsonStorage::new()
            .read_optional(&dir.path().join("missing.json"))
            .unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_section_name_validation() {
        assert!(validate_section_name("bidding").is_ok());
        assert!(validate_section_name("test_section-2").is_ok());
        assert!(validate_section_name("").is_err());
        assert!(validate_section_name("../etc").is_err());
        assert!(validate_section_name("a b").is_err());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryOptionStore::new();
        assert!(store.load("s").unwrap().is_none());

        let mut values = Map::new();
        values.insert("active".into(), json!(true));
        store.save("s", &values).unwrap();

        assert_eq!(store.load("s").unwrap(), Some(values));
        assert!(store.load("other").unwrap().is_none());
    }

    #[test]
    fn test_file_store_paths_and_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FileOptionStore::new(dir.path(), "ads_", JsonStorage::new());
        assert_eq!(
            store.section_path("bidding"),
            dir.path().join("ads_bidding.json")
        );

        assert!(store.load("bidding").unwrap().is_none());

        let mut values = Map::new();
        values.insert("active".into(), json!(true));
        values.insert("price_granularity".into(), json!("dense"));
        store.save("bidding", &values).unwrap();

        assert!(dir.path().join("ads_bidding.json").exists());
        assert_eq!(store.load("bidding").unwrap(), Some(values));
    }

    #[test]
    fn test_file_store_rejects_non_object_record() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("ads_broken.json"), "[1, 2]").unwrap();

        let store = FileOptionStore::new(dir.path(), "ads_", JsonStorage::new());
        assert!(matches!(store.load("broken"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_file_store_rejects_bad_section() {
        let dir = tempdir().unwrap();
        let store = FileOptionStore::new(dir.path(), "ads_", JsonStorage::new());
        assert!(matches!(
            store.save("../escape", &Map::new()),
            Err(Error::InvalidSection(_))
        ));
    }
}
