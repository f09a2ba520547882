//! Settings manager configuration

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "toml")]
use crate::storage::TomlStorage;
use crate::storage::{FileOptionStore, JsonStorage, MemoryOptionStore, OptionStore};

/// Namespace the REST routes are mounted under unless configured otherwise
pub const DEFAULT_REST_NAMESPACE: &str = "/ads/v1";

/// Configuration for initializing the `SettingsManager`
#[derive(Clone)]
pub struct SettingsConfig {
    /// Application name (used in logs and the default option prefix)
    pub app_name: String,

    /// Per-section persistence slot
    pub store: Arc<dyn OptionStore>,

    /// Namespace prefix for REST routes
    pub rest_namespace: String,
}

impl fmt::Debug for SettingsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsConfig")
            .field("app_name", &self.app_name)
            .field("store", &self.store.backend_name())
            .field("rest_namespace", &self.rest_namespace)
            .finish()
    }
}

impl SettingsConfig {
    /// Create a new builder for `SettingsConfig`
    ///
    /// # Example
    /// ```rust
    /// use adconf::SettingsConfig;
    ///
    /// let config = SettingsConfig::builder("my-site")
    ///     .config_dir("/tmp/my-site")
    ///     .build();
    /// ```
    pub fn builder(app_name: impl Into<String>) -> SettingsConfigBuilder {
        SettingsConfigBuilder::new(app_name)
    }

    /// Configuration backed by a [`MemoryOptionStore`]
    pub fn in_memory(app_name: impl Into<String>) -> Self {
        SettingsConfigBuilder::new(app_name).in_memory().build()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json { pretty: bool },
    #[cfg(feature = "toml")]
    Toml,
}

#[derive(Clone)]
enum StoreChoice {
    Files(FileFormat),
    Memory,
    Custom(Arc<dyn OptionStore>),
}

/// Builder for creating `SettingsConfig` with a fluent API
#[derive(Clone)]
pub struct SettingsConfigBuilder {
    app_name: String,
    config_dir: Option<PathBuf>,
    option_prefix: Option<String>,
    rest_namespace: String,
    store: StoreChoice,
}

impl fmt::Debug for SettingsConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = match &self.store {
            StoreChoice::Files(format) => format!("{format:?}"),
            StoreChoice::Memory => "Memory".to_string(),
            StoreChoice::Custom(store) => format!("Custom({})", store.backend_name()),
        };
        f.debug_struct("SettingsConfigBuilder")
            .field("app_name", &self.app_name)
            .field("config_dir", &self.config_dir)
            .field("option_prefix", &self.option_prefix)
            .field("rest_namespace", &self.rest_namespace)
            .field("store", &store)
            .finish()
    }
}

impl SettingsConfigBuilder {
    /// Create a new builder with the required app name
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            config_dir: None,
            option_prefix: None,
            rest_namespace: DEFAULT_REST_NAMESPACE.to_string(),
            store: StoreChoice::Files(FileFormat::Json { pretty: true }),
        }
    }

    /// Set the configuration directory
    ///
    /// Supports `~` expansion for home directory.
    #[must_use]
    pub fn config_dir(mut self, path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        let expanded = match (path.strip_prefix("~"), dirs::home_dir()) {
            (Ok(rest), Some(home)) => home.join(rest),
            _ => path,
        };
        self.config_dir = Some(expanded);
        self
    }

    /// Prefix for section file names (default: `"{app_name}_"`)
    #[must_use]
    pub fn option_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.option_prefix = Some(prefix.into());
        self
    }

    /// Use compact JSON (no pretty printing)
    #[must_use]
    pub fn compact_json(mut self) -> Self {
        self.store = StoreChoice::Files(FileFormat::Json { pretty: false });
        self
    }

    /// Store sections as TOML files
    #[cfg(feature = "toml")]
    #[must_use]
    pub fn toml(mut self) -> Self {
        self.store = StoreChoice::Files(FileFormat::Toml);
        self
    }

    /// Keep sections in memory only
    #[must_use]
    pub fn in_memory(mut self) -> Self {
        self.store = StoreChoice::Memory;
        self
    }

    /// Use a caller-provided option store
    #[must_use]
    pub fn with_store(mut self, store: impl OptionStore + 'static) -> Self {
        self.store = StoreChoice::Custom(Arc::new(store));
        self
    }

    /// Mount REST routes under `namespace` (default: `/ads/v1`)
    #[must_use]
    pub fn rest_namespace(mut self, namespace: impl Into<String>) -> Self {
        let namespace: String = namespace.into();
        let trimmed = namespace.trim_end_matches('/');
        self.rest_namespace = if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        self
    }

    /// Build the `SettingsConfig`
    ///
    /// If `config_dir` is not set, file stores use the system config directory for the app.
    #[must_use]
    pub fn build(self) -> SettingsConfig {
        let prefix = self
            .option_prefix
            .unwrap_or_else(|| format!("{}_", self.app_name));
        let app_name = self.app_name;
        let dir = || {
            self.config_dir.clone().unwrap_or_else(|| {
                dirs::config_dir()
                    .map(|d| d.join(&app_name))
                    .unwrap_or_else(|| PathBuf::from("."))
            })
        };

        let store: Arc<dyn OptionStore> = match self.store {
            StoreChoice::Files(FileFormat::Json { pretty }) => {
                let storage = if pretty {
                    JsonStorage::new()
                } else {
                    JsonStorage::compact()
                };
                Arc::new(FileOptionStore::new(dir(), prefix, storage))
            }
            #[cfg(feature = "toml")]
            StoreChoice::Files(FileFormat::Toml) => {
                Arc::new(FileOptionStore::new(dir(), prefix, TomlStorage::new()))
            }
            StoreChoice::Memory => Arc::new(MemoryOptionStore::new()),
            StoreChoice::Custom(store) => store,
        };

        SettingsConfig {
            app_name,
            store,
            rest_namespace: self.rest_namespace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = SettingsConfig::builder("test-site")
            .config_dir("/tmp/test-site")
            .build();

        assert_eq!(config.app_name, "test-site");
        assert_eq!(config.store.backend_name(), "file");
        assert_eq!(config.rest_namespace, DEFAULT_REST_NAMESPACE);
    }

    #[test]
    fn test_in_memory_config() {
        let config = SettingsConfig::in_memory("test-site");
        assert_eq!(config.store.backend_name(), "memory");
    }

    #[test]
    fn test_rest_namespace_normalized() {
        let config = SettingsConfig::builder("s")
            .in_memory()
            .rest_namespace("my-ads/v2/")
            .build();
        assert_eq!(config.rest_namespace, "/my-ads/v2");

        let bare = SettingsConfig::builder("s").in_memory().rest_namespace("").build();
        assert_eq!(bare.rest_namespace, "");
    }

    #[test]
    fn test_home_expansion() {
        let builder = SettingsConfig::builder("s").config_dir("~/ads");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(builder.config_dir, Some(home.join("ads")));
        }
    }
}
