//! Builder for SettingsManager
//!
//! This module contains [`SettingsManagerBuilder`] which provides a fluent API
//! for creating a [`SettingsManager`](super::SettingsManager) with its fields
//! already registered.

use crate::config::{FieldDefinition, SettingsConfigBuilder};
use crate::error::Result;
use crate::storage::OptionStore;
use std::path::PathBuf;

use super::SettingsManager;

/// Builder for creating a [`SettingsManager`] with a fluent API.
///
/// # Example
///
/// ```rust,no_run
/// use adconf::{FieldDefinition, SettingsManager};
///
/// let manager = SettingsManager::builder("my-site")
///     .config_dir("~/.config/my-site")
///     .with_field(FieldDefinition::boolean("general", "active", false))
///     .build()
///     .unwrap();
/// ```
pub struct SettingsManagerBuilder {
    config_builder: SettingsConfigBuilder,
    fields: Vec<FieldDefinition>,
}

impl SettingsManagerBuilder {
    /// Create a new builder with the required app name.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            config_builder: SettingsConfigBuilder::new(app_name),
            fields: Vec::new(),
        }
    }

    /// Set the configuration directory.
    ///
    /// Supports `~` expansion for home directory.
    #[must_use]
    pub fn config_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_builder = self.config_builder.config_dir(path);
        self
    }

    /// Prefix for section file names (default: `"{app_name}_"`).
    #[must_use]
    pub fn option_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.option_prefix(prefix);
        self
    }

    /// Use compact JSON (no pretty printing).
    #[must_use]
    pub fn compact_json(mut self) -> Self {
        self.config_builder = self.config_builder.compact_json();
        self
    }

    /// Store sections as TOML files.
    #[cfg(feature = "toml")]
    #[must_use]
    pub fn toml(mut self) -> Self {
        self.config_builder = self.config_builder.toml();
        self
    }

    /// Keep sections in memory only.
    #[must_use]
    pub fn in_memory(mut self) -> Self {
        self.config_builder = self.config_builder.in_memory();
        self
    }

    /// Use a caller-provided option store.
    #[must_use]
    pub fn with_store(mut self, store: impl OptionStore + 'static) -> Self {
        self.config_builder = self.config_builder.with_store(store);
        self
    }

    /// Mount REST routes under `namespace`.
    #[must_use]
    pub fn rest_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.rest_namespace(namespace);
        self
    }

    /// Register a field at build time.
    #[must_use]
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Register several fields at build time.
    #[must_use]
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = FieldDefinition>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Build the `SettingsManager`.
    ///
    /// # Errors
    ///
    /// Returns an error if any registered field is invalid.
    pub fn build(self) -> Result<SettingsManager> {
        let manager = SettingsManager::new(self.config_builder.build());
        manager.register_fields(self.fields)?;
        Ok(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_registers_fields() {
        let manager = SettingsManager::builder("test")
            .in_memory()
            .with_field(FieldDefinition::boolean("a", "flag", true))
            .with_fields([
                FieldDefinition::integer("a", "n", 1),
                FieldDefinition::string("b", "s", "x"),
            ])
            .build()
            .unwrap();

        assert_eq!(manager.settings_list().len(), 3);
        assert_eq!(manager.config().store.backend_name(), "memory");
    }

    #[test]
    fn test_builder_propagates_invalid_field() {
        let result = SettingsManager::builder("test")
            .in_memory()
            .with_field(FieldDefinition::boolean("no/slashes", "flag", true))
            .build();
        assert!(result.is_err());
    }
}
