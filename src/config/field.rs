//! Field definitions for settings sections
//!
//! A [`FieldDefinition`] describes one configurable value: which section it
//! lives in, its key, its declared [`FieldType`], default, visibility and
//! (optionally) the closed set of values it accepts.
//!
//! Definitions are plain serde data so they can be declared in code with the
//! constructors below or loaded from JSON:
//!
//! ```rust
//! use adconf::{FieldDefinition, FieldType, opt};
//!
//! let active = FieldDefinition::boolean("bidding", "active", false)
//!     .description("Enable header bidding");
//!
//! let granularity = FieldDefinition::select("bidding", "price_granularity", "dense", vec![
//!     opt("low", "Low"),
//!     opt("dense", "Dense"),
//! ]);
//!
//! // A definition without "type" is a string field
//! let typeless: FieldDefinition = serde_json::from_str(
//!     r#"{"section": "test_section", "key": "typeless_field"}"#,
//! ).unwrap();
//! assert_eq!(typeless.field_type, FieldType::String);
//! ```

use crate::coerce;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// =============================================================================
// Field Types
// =============================================================================

/// Declared type of a field value
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// `true` / `false`
    Boolean,
    /// Signed integer
    Integer,
    /// Free text (the type of any field declared without one)
    #[default]
    String,
    /// List of values
    Array,
}

impl FieldType {
    /// Name used in serialized definitions
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::String => "string",
            FieldType::Array => "array",
        }
    }

    /// Value a field of this type takes when it has neither a default nor a stored value
    #[must_use]
    pub fn zero_value(self) -> Value {
        match self {
            FieldType::Boolean => Value::Bool(false),
            FieldType::Integer => Value::from(0),
            FieldType::String => Value::String(String::new()),
            FieldType::Array => Value::Array(Vec::new()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Field Option
// =============================================================================

/// One allowed value of an options-constrained field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldOption {
    /// Value to store
    pub value: Value,
    /// Display name
    pub name: String,
}

impl FieldOption {
    /// Create a string-valued option
    pub fn new(value: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            value: Value::String(value.into()),
            name: name.into(),
        }
    }
}

/// Shorthand for creating a [`FieldOption`]
///
/// # Example
/// ```rust
/// use adconf::opt;
/// let options = vec![opt("option1", "Option 1"), opt("option2", "Option 2")];
/// ```
pub fn opt(value: impl Into<String>, name: impl Into<String>) -> FieldOption {
    FieldOption::new(value, name)
}

// =============================================================================
// Field Definition
// =============================================================================

fn default_public() -> bool {
    true
}

/// Metadata for a single configurable value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Section grouping related fields (filled in by bidder registration when omitted)
    #[serde(default)]
    pub section: String,

    /// Key, unique within the section
    pub key: String,

    /// Declared type
    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    /// Value used when nothing is stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Whether the value may appear in public snapshots
    #[serde(default = "default_public")]
    pub public: bool,

    /// Closed set of accepted values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl FieldDefinition {
    // =========================================================================
    // Type-specific constructors
    // =========================================================================

    /// Create a field of the given type with no default
    pub fn new(section: impl Into<String>, key: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            section: section.into(),
            key: key.into(),
            field_type,
            default: None,
            public: true,
            options: None,
            description: None,
            help: None,
        }
    }

    /// Create a boolean field
    pub fn boolean(section: impl Into<String>, key: impl Into<String>, default: bool) -> Self {
        Self::new(section, key, FieldType::Boolean).default_value(Value::Bool(default))
    }

    /// Create an integer field
    pub fn integer(section: impl Into<String>, key: impl Into<String>, default: i64) -> Self {
        Self::new(section, key, FieldType::Integer).default_value(Value::from(default))
    }

    /// Create a string field
    pub fn string(
        section: impl Into<String>,
        key: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        Self::new(section, key, FieldType::String).default_value(Value::String(default.into()))
    }

    /// Create a list field
    pub fn array(section: impl Into<String>, key: impl Into<String>, default: &[&str]) -> Self {
        let items = default.iter().map(|s| Value::String((*s).to_string())).collect();
        Self::new(section, key, FieldType::Array).default_value(Value::Array(items))
    }

    /// Create a string field restricted to `options`
    pub fn select(
        section: impl Into<String>,
        key: impl Into<String>,
        default: impl Into<String>,
        options: Vec<FieldOption>,
    ) -> Self {
        Self::string(section, key, default).options(options)
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = Some(options);
        self
    }

    /// Exclude this field from public snapshots
    #[must_use]
    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    #[must_use]
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Default value coerced to the declared type
    #[must_use]
    pub fn resolved_default(&self) -> Value {
        self.default
            .as_ref()
            .map_or_else(|| self.field_type.zero_value(), |v| self.coerce(v))
    }

    /// Coerce a raw value to this field's type
    #[must_use]
    pub fn coerce(&self, raw: &Value) -> Value {
        coerce::coerce(raw, self.field_type)
    }

    /// Check a raw value against the field's options, if any.
    ///
    /// The comparison is made on string forms, so `2` matches an option `"2"`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the value is not one of the options.
    pub fn check_options(&self, raw: &Value) -> Result<(), String> {
        let Some(options) = &self.options else {
            return Ok(());
        };
        let candidate = coerce::to_text(raw);
        if options
            .iter()
            .any(|option| coerce::to_text(&option.value) == candidate)
        {
            Ok(())
        } else {
            Err("Value must be one of the available options".to_string())
        }
    }

    /// `section.key`, the form used by validators and change listeners
    #[must_use]
    pub fn full_key(&self) -> String {
        format!("{}.{}", self.section, self.key)
    }
}
