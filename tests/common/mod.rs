//! Common test utilities for adconf integration tests
//!
//! Provides shared test fixtures, the sample settings list, and helper functions.

#![allow(dead_code)]

use adconf::{FieldDefinition, SettingsManager};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const TEST_SECTION: &str = "test_section";

// =============================================================================
// Sample Settings List
// =============================================================================

/// Field definitions covering every field type, a private field, a select
/// field and a field declared without a type
pub fn settings_list() -> Vec<FieldDefinition> {
    serde_json::from_value(json!([
        {
            "description": "A setting section",
            "help": "A setting section description or help text",
            "section": TEST_SECTION,
            "key": "active",
            "type": "boolean",
            "default": false,
            "public": true,
        },
        {
            "description": "My first field",
            "help": "Help text",
            "section": TEST_SECTION,
            "key": "first_field",
            "type": "boolean",
            "default": true,
            "public": true,
        },
        {
            "description": "My number field",
            "help": "Help text",
            "section": TEST_SECTION,
            "key": "number_field",
            "type": "integer",
            "default": true,
            "public": true,
        },
        {
            "description": "A private field",
            "help": "Help text",
            "section": TEST_SECTION,
            "key": "private_field",
            "type": "string",
            "default": "",
            "public": false,
        },
        {
            "description": "A select field",
            "help": "Help text",
            "section": TEST_SECTION,
            "key": "select_field",
            "type": "string",
            "options": [
                { "value": "option1", "name": "Option 1" },
                { "value": "option2", "name": "Option 2" },
            ],
        },
        {
            "description": "A field without type",
            "help": "Help text",
            "section": TEST_SECTION,
            "key": "typeless_field",
        },
    ]))
    .expect("sample settings list deserializes")
}

// =============================================================================
// Test Fixtures
// =============================================================================

/// Test fixture that provides a temporary directory and a file-backed manager
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub manager: SettingsManager,
}

impl TestFixture {
    /// Create a new test fixture with the sample settings registered
    pub fn new() -> Self {
        init_logging();
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = open_manager(temp_dir.path());
        Self { temp_dir, manager }
    }

    /// Open a second manager on the same directory
    pub fn reopen(&self) -> SettingsManager {
        open_manager(self.temp_dir.path())
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Get the file path of a section
    pub fn section_path(&self, section: &str) -> PathBuf {
        self.temp_dir.path().join(format!("test-app_{section}.json"))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn open_manager(dir: &Path) -> SettingsManager {
    SettingsManager::builder("test-app")
        .config_dir(dir)
        .with_fields(settings_list())
        .build()
        .expect("Failed to create manager")
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Route `log` output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Object members of a `json!` literal
pub fn values(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("values must be a JSON object")
}

/// Read the raw JSON file of a section
pub fn read_section_file(fixture: &TestFixture, section: &str) -> Option<Value> {
    let content = std::fs::read_to_string(fixture.section_path(section)).ok()?;
    serde_json::from_str(&content).ok()
}
