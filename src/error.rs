//! Error types for adconf

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for adconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for adconf
#[derive(Error, Debug)]
pub enum Error {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Failed to serialize data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to parse stored data: {0}")]
    Parse(String),

    // -------------------------------------------------------------------------
    // Settings Errors
    // -------------------------------------------------------------------------
    #[error("Setting not found: {0}")]
    SettingNotFound(String),

    #[error("Invalid value for {key}: {reason}")]
    Validation { key: String, reason: String },

    #[error("Invalid section name '{0}'")]
    InvalidSection(String),

    // -------------------------------------------------------------------------
    // Bidding Errors
    // -------------------------------------------------------------------------
    #[error("Invalid bidder definition: {0}")]
    InvalidBidder(String),

    // -------------------------------------------------------------------------
    // Marketplace Errors
    // -------------------------------------------------------------------------
    #[error("Product {0} not found")]
    ProductNotFound(u64),

    #[error("Invalid product {field}: {reason}")]
    InvalidProduct { field: String, reason: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if this is a "not found" type error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::SettingNotFound(_) | Error::ProductNotFound(_)
        )
    }

    /// Check if this error was caused by caller input rather than the host
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. }
                | Error::InvalidSection(_)
                | Error::InvalidBidder(_)
                | Error::InvalidProduct { .. }
        )
    }

    pub(crate) fn validation(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Validation {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_product(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidProduct {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
