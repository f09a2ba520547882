//! Settings registry
//!
//! This module contains the [`SettingsManager`] struct, the registry of field
//! definitions and the entry point for reading and writing settings sections.

use crate::config::{FieldDefinition, SettingsConfig};
use crate::error::{Error, Result};
use crate::events::EventManager;
use crate::storage::{OptionStore, validate_section_name};
use crate::sync::RwLockExt;

use log::{info, warn};
use std::sync::{Arc, Mutex, RwLock};

mod builder;
mod operations;

pub use builder::SettingsManagerBuilder;

/// Registry of settings fields and gateway to their persisted values.
///
/// Fields are registered up front (by the application, and by bidder
/// registration); reads merge registered defaults with the persisted record
/// of a section, and writes validate and coerce values per field.
///
/// # Example
///
/// ```rust
/// use adconf::{FieldDefinition, SettingsManager};
/// use serde_json::json;
///
/// let manager = SettingsManager::builder("my-site")
///     .in_memory()
///     .with_field(FieldDefinition::boolean("general", "active", false))
///     .with_field(FieldDefinition::integer("general", "refresh", 30))
///     .build()?;
///
/// let values = json!({ "active": "1", "refresh": "60" });
/// let settings = manager.update_section("general", values.as_object().unwrap())?;
///
/// assert_eq!(settings["active"], json!(true));
/// assert_eq!(settings["refresh"], json!(60));
/// # Ok::<(), adconf::Error>(())
/// ```
pub struct SettingsManager {
    config: SettingsConfig,

    /// Registered field definitions, in registration order
    fields: RwLock<Vec<FieldDefinition>>,

    /// Change listeners and validators
    events: Arc<EventManager>,

    /// Serializes read-modify-write of section records
    save_mutex: Mutex<()>,
}

impl SettingsManager {
    /// Create a builder for `SettingsManager` with a fluent API.
    pub fn builder(app_name: impl Into<String>) -> SettingsManagerBuilder {
        SettingsManagerBuilder::new(app_name)
    }

    /// Create a settings manager with no registered fields.
    #[must_use]
    pub fn new(config: SettingsConfig) -> Self {
        info!(
            "Initialized adconf SettingsManager for '{}' ({} store)",
            config.app_name,
            config.store.backend_name()
        );

        Self {
            config,
            fields: RwLock::new(Vec::new()),
            events: Arc::new(EventManager::new()),
            save_mutex: Mutex::new(()),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &SettingsConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &dyn OptionStore {
        self.config.store.as_ref()
    }

    /// Get the event manager for registering change listeners and validators
    ///
    /// # Example
    ///
    /// ```
    /// # use adconf::*;
    /// # use serde_json::Value;
    /// # let manager = SettingsManager::builder("test").in_memory().build().unwrap();
    /// manager.events().watch("bidding.active", |key, _old, new| {
    ///     println!("{key} is now {new}");
    /// });
    ///
    /// manager.events().add_validator("general.refresh", |v: &Value| {
    ///     if v.as_i64().is_some_and(|n| n >= 30) {
    ///         Ok(())
    ///     } else {
    ///         Err("Refresh must be at least 30 seconds".into())
    ///     }
    /// });
    /// ```
    pub fn events(&self) -> &Arc<EventManager> {
        &self.events
    }

    // =========================================================================
    // Field registration
    // =========================================================================

    /// Register field definitions.
    ///
    /// May be called any number of times. Registering a `(section, key)` pair
    /// that already exists replaces the earlier definition in place.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSection` for a malformed section name and
    /// `Error::Config` for an empty key. Nothing is registered in that case.
    pub fn register_fields(&self, fields: impl IntoIterator<Item = FieldDefinition>) -> Result<()> {
        let fields: Vec<FieldDefinition> = fields.into_iter().collect();
        for field in &fields {
            validate_section_name(&field.section)?;
            if field.key.is_empty() {
                return Err(Error::Config(format!(
                    "Field in section '{}' has an empty key",
                    field.section
                )));
            }
        }

        let mut registered = self.fields.write_recovered();
        for field in fields {
            if let Some(existing) = registered
                .iter_mut()
                .find(|f| f.section == field.section && f.key == field.key)
            {
                warn!("Field '{}' registered twice, replacing", field.full_key());
                *existing = field;
            } else {
                registered.push(field);
            }
        }
        Ok(())
    }

    /// All registered field definitions, in registration order
    pub fn settings_list(&self) -> Vec<FieldDefinition> {
        self.fields.read_recovered().clone()
    }

    /// Registered field definitions of one section
    pub fn section_fields(&self, section: &str) -> Vec<FieldDefinition> {
        self.fields
            .read_recovered()
            .iter()
            .filter(|f| f.section == section)
            .cloned()
            .collect()
    }

    /// Names of all sections with at least one registered field
    pub fn sections(&self) -> Vec<String> {
        let mut sections: Vec<String> = Vec::new();
        for field in self.fields.read_recovered().iter() {
            if !sections.contains(&field.section) {
                sections.push(field.section.clone());
            }
        }
        sections
    }

    /// Full definition of `section.key`.
    ///
    /// The returned definition always carries a type; fields declared without
    /// one are `string` fields.
    ///
    /// # Errors
    ///
    /// Returns `Error::SettingNotFound` if no such field is registered.
    pub fn get_setting_config(&self, section: &str, key: &str) -> Result<FieldDefinition> {
        self.fields
            .read_recovered()
            .iter()
            .find(|f| f.section == section && f.key == key)
            .cloned()
            .ok_or_else(|| Error::SettingNotFound(format!("{section}.{key}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldType, opt};

    fn manager() -> SettingsManager {
        SettingsManager::new(SettingsConfig::in_memory("test"))
    }

    #[test]
    fn test_register_is_additive() {
        let manager = manager();
        manager
            .register_fields([FieldDefinition::boolean("a", "one", false)])
            .unwrap();
        manager
            .register_fields([
                FieldDefinition::string("a", "two", ""),
                FieldDefinition::integer("b", "three", 3),
            ])
            .unwrap();

        let keys: Vec<String> = manager.settings_list().into_iter().map(|f| f.key).collect();
        assert_eq!(keys, vec!["one", "two", "three"]);
        assert_eq!(manager.sections(), vec!["a", "b"]);
        assert_eq!(manager.section_fields("a").len(), 2);
    }

    #[test]
    fn test_duplicate_key_replaces_in_place() {
        let manager = manager();
        manager
            .register_fields([
                FieldDefinition::string("a", "select", "x"),
                FieldDefinition::boolean("a", "flag", false),
            ])
            .unwrap();
        manager
            .register_fields([FieldDefinition::select(
                "a",
                "select",
                "y",
                vec![opt("y", "Y")],
            )])
            .unwrap();

        let fields = manager.section_fields("a");
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].key, "select");
        assert!(fields[0].options.is_some());
    }

    #[test]
    fn test_register_rejects_bad_definitions() {
        let manager = manager();
        let result = manager.register_fields([
            FieldDefinition::boolean("ok", "fine", false),
            FieldDefinition::boolean("bad section", "k", false),
        ]);
        assert!(matches!(result, Err(Error::InvalidSection(_))));
        assert!(manager.settings_list().is_empty());

        let empty_key = manager.register_fields([FieldDefinition::boolean("ok", "", false)]);
        assert!(matches!(empty_key, Err(Error::Config(_))));
    }

    #[test]
    fn test_get_setting_config() {
        let manager = manager();
        manager
            .register_fields([FieldDefinition::new("s", "typeless", FieldType::default())])
            .unwrap();

        let config = manager.get_setting_config("s", "typeless").unwrap();
        assert_eq!(config.field_type, FieldType::String);

        let missing = manager.get_setting_config("s", "nope");
        assert!(matches!(missing, Err(Error::SettingNotFound(ref k)) if k == "s.nope"));
    }
}
