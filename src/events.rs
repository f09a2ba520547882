//! Change listeners and write-time validators for settings sections
//!
//! Keys are always in `section.key` form. Validators run on coerced values
//! inside `update_section`, before anything is persisted; listeners run after
//! the section was saved, once per value that actually changed.

use crate::sync::RwLockExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

/// Callback receiving (`full_key`, `old_value`, `new_value`)
pub type ChangeCallback = Arc<dyn Fn(&str, &Value, &Value) + Send + Sync>;

/// Validator receiving the coerced value; `Err` carries the reason
pub type Validator = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Manages event listeners and validators for settings changes
pub struct EventManager {
    /// Called for every change
    global_listeners: RwLock<Vec<ChangeCallback>>,

    /// Called for changes to any key of one section
    section_listeners: RwLock<HashMap<String, Vec<ChangeCallback>>>,

    /// Called for changes to one `section.key`
    key_listeners: RwLock<HashMap<String, Vec<ChangeCallback>>>,

    validators: RwLock<HashMap<String, Vec<Validator>>>,
}

impl EventManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            global_listeners: RwLock::new(Vec::new()),
            section_listeners: RwLock::new(HashMap::new()),
            key_listeners: RwLock::new(HashMap::new()),
            validators: RwLock::new(HashMap::new()),
        }
    }

    /// Register a listener called for all settings changes
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&str, &Value, &Value) + Send + Sync + 'static,
    {
        self.global_listeners
            .write_recovered()
            .push(Arc::new(callback));
    }

    /// Register a listener for every key of `section`
    pub fn watch_section<F>(&self, section: &str, callback: F)
    where
        F: Fn(&str, &Value, &Value) + Send + Sync + 'static,
    {
        self.section_listeners
            .write_recovered()
            .entry(section.to_string())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Register a listener for one `section.key`
    pub fn watch<F>(&self, full_key: &str, callback: F)
    where
        F: Fn(&str, &Value, &Value) + Send + Sync + 'static,
    {
        self.key_listeners
            .write_recovered()
            .entry(full_key.to_string())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Register a validator for one `section.key`
    ///
    /// A failing validator rejects the whole `update_section` call it is part of.
    pub fn add_validator<F>(&self, full_key: &str, validator: F)
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators
            .write_recovered()
            .entry(full_key.to_string())
            .or_default()
            .push(Arc::new(validator));
    }

    /// Run the validators of `full_key` against `value`
    ///
    /// # Errors
    ///
    /// Returns the first validation error message.
    pub fn validate(&self, full_key: &str, value: &Value) -> Result<(), String> {
        let guard = self.validators.read_recovered();
        if let Some(validators) = guard.get(full_key) {
            for validator in validators {
                validator(value)?;
            }
        }
        Ok(())
    }

    /// Notify listeners about a change of `section.key`
    pub fn notify(&self, section: &str, key: &str, old_value: &Value, new_value: &Value) {
        let full_key = format!("{section}.{key}");

        // Snapshot the callbacks so a listener may register more listeners.
        let mut callbacks: Vec<ChangeCallback> = self.global_listeners.read_recovered().clone();
        if let Some(listeners) = self.section_listeners.read_recovered().get(section) {
            callbacks.extend(listeners.iter().cloned());
        }
        if let Some(listeners) = self.key_listeners.read_recovered().get(&full_key) {
            callbacks.extend(listeners.iter().cloned());
        }

        for callback in callbacks {
            callback(&full_key, old_value, new_value);
        }
    }

    /// Remove all listeners for one `section.key`
    pub fn unwatch(&self, full_key: &str) {
        self.key_listeners.write_recovered().remove(full_key);
    }

    /// Clear all listeners (validators are kept)
    pub fn clear(&self) {
        self.global_listeners.write_recovered().clear();
        self.section_listeners.write_recovered().clear();
        self.key_listeners.write_recovered().clear();
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
