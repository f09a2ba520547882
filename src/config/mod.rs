//! Core configuration types
//!
//! This module contains the foundational types for settings management:
//! - `SettingsConfig` - Configuration for the settings manager
//! - `FieldDefinition` - Metadata for one configurable value (type, default, options)

mod field;
mod types;

pub use field::{FieldDefinition, FieldOption, FieldType, opt};

pub use types::{DEFAULT_REST_NAMESPACE, SettingsConfig, SettingsConfigBuilder};
