use crate::config::FieldDefinition;
use crate::error::{Error, Result};
use crate::manager::SettingsManager;
use crate::storage::validate_section_name;
use crate::sync::MutexExt;

use log::debug;
use serde_json::{Map, Value};

impl SettingsManager {
    /// Current values of every registered field of `section`.
    ///
    /// Each value is the persisted one if present, else the field default,
    /// coerced to the field type. Persisted keys with no registered field are
    /// not returned. With `public_only`, private fields are omitted.
    ///
    /// A section without registered fields yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSection` for a malformed section name, or a
    /// storage error if the persisted record cannot be read.
    pub fn get_settings(&self, section: &str, public_only: bool) -> Result<Map<String, Value>> {
        validate_section_name(section)?;
        let fields = self.section_fields(section);
        if fields.is_empty() {
            return Ok(Map::new());
        }

        let stored = self.store().load(section)?.unwrap_or_default();
        Ok(fields
            .iter()
            .filter(|field| field.public || !public_only)
            .map(|field| (field.key.clone(), effective_value(field, stored.get(&field.key))))
            .collect())
    }

    /// Current value of one field.
    ///
    /// # Errors
    ///
    /// Returns `Error::SettingNotFound` for an unregistered field, or a
    /// storage error if the persisted record cannot be read.
    pub fn get_setting(&self, section: &str, key: &str) -> Result<Value> {
        let field = self.get_setting_config(section, key)?;
        let stored = self.store().load(section)?.unwrap_or_default();
        Ok(effective_value(&field, stored.get(key)))
    }

    /// Validate, coerce and persist `values` into `section`.
    ///
    /// - Keys with no registered field are dropped.
    /// - Fields with options only accept one of the option values.
    /// - Registered validators run on the coerced value.
    ///
    /// The call is all-or-nothing: if any value is rejected, nothing is
    /// persisted. On success the merged settings of the section are returned,
    /// private fields included.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` naming the first rejected key, or a
    /// storage error if the record cannot be read or written.
    pub fn update_section(
        &self,
        section: &str,
        values: &Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        validate_section_name(section)?;
        let fields = self.section_fields(section);

        let mut accepted: Vec<(&FieldDefinition, Value)> = Vec::with_capacity(values.len());
        for (key, raw) in values {
            let Some(field) = fields.iter().find(|f| f.key == *key) else {
                debug!("Dropping unregistered setting {section}.{key}");
                continue;
            };

            field
                .check_options(raw)
                .map_err(|reason| Error::validation(key, reason))?;

            let value = field.coerce(raw);
            self.events()
                .validate(&field.full_key(), &value)
                .map_err(|reason| Error::validation(key, reason))?;

            accepted.push((field, value));
        }

        if !accepted.is_empty() {
            let mut changes = Vec::new();
            {
                let _guard = self.save_mutex.lock_recovered();
                let mut stored = self.store().load(section)?.unwrap_or_default();
                for (field, value) in &accepted {
                    let old = effective_value(field, stored.get(&field.key));
                    if old != *value {
                        changes.push((field.key.as_str(), old, value.clone()));
                    }
                    stored.insert(field.key.clone(), value.clone());
                }
                self.store().save(section, &stored)?;
            }
            debug!(
                "Updated section '{section}': {} value(s), {} changed",
                accepted.len(),
                changes.len()
            );

            for (key, old, new) in &changes {
                self.events().notify(section, key, old, new);
            }
        }

        self.get_settings(section, false)
    }
}

fn effective_value(field: &FieldDefinition, stored: Option<&Value>) -> Value {
    stored.map_or_else(|| field.resolved_default(), |value| field.coerce(value))
}
