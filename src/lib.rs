//! # adconf - ad configuration registry
//!
//! Configuration and content layer for an advertising integration on a
//! publishing site.
//!
//! ## Features
//!
//! - **Settings Registry**: Typed fields grouped into sections, each section persisted as
//!   one record. Reads fall back to defaults; writes are coerced, validated and all-or-nothing
//! - **Public Filtering**: Private fields (API keys, account ids) never leave through public reads
//! - **Header Bidding**: Pluggable bidder definitions that add their own settings fields and
//!   become available once configured
//! - **Marketplace**: Ad products with a price, target placements and required creative sizes
//! - **REST Surface**: An in-process dispatcher mapping routes to the registries
//! - **Change Events**: Listeners and validators keyed by section or `section.key`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use adconf::{FieldDefinition, SettingsManager, opt};
//! use serde_json::json;
//!
//! # fn example() -> adconf::Result<()> {
//! let manager = SettingsManager::builder("my-site")
//!     .config_dir("~/.config/my-site")
//!     .with_fields([
//!         FieldDefinition::string("general", "site_id", ""),
//!         FieldDefinition::string("general", "api_key", "").private(),
//!         FieldDefinition::select("general", "layout", "grid", vec![
//!             opt("grid", "Grid"),
//!             opt("list", "List"),
//!         ]),
//!     ])
//!     .build()?;
//!
//! let values = json!({ "site_id": 42, "layout": "list" });
//! manager.update_section("general", values.as_object().unwrap())?;
//!
//! // Public reads omit `api_key`; `site_id` was coerced to a string
//! let public = manager.get_settings("general", true)?;
//! assert_eq!(public["site_id"], json!("42"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Default Value Behavior
//!
//! Nothing is written until a section is updated. Until then, and for keys never
//! submitted, reads return the field default, so changing a default in code
//! applies to every site that has not customized the field.
//!
//! ## Marketplace over REST
//!
//! ```rust
//! use adconf::{ProductService, Request, RestApi, SettingsManager};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let settings = Arc::new(SettingsManager::builder("my-site").in_memory().build()?);
//! let api = RestApi::new(settings, Arc::new(ProductService::in_memory()));
//!
//! let response = api.dispatch(&Request::post("/ads/v1/products", json!({
//!     "price": "5",
//!     "placements": ["global_below_header"],
//!     "required_sizes": ["920x250"],
//! })));
//! assert!(response.is_success());
//! assert_eq!(response.data["title"], json!("Ad – Below Header"));
//! # Ok::<(), adconf::Error>(())
//! ```

// Core modules
mod bidding;
mod error;
mod events;
mod manager;
mod rest;
mod sync;

pub mod coerce;
pub mod storage;

// Grouped modules
pub mod config;
pub mod marketplace;

// Re-exports from core
pub use bidding::{Bidder, BidderConfig, Bidding, SETTINGS_SECTION_NAME as BIDDING_SECTION};
pub use error::{Error, Result};
pub use events::EventManager;
pub use manager::{SettingsManager, SettingsManagerBuilder};
pub use rest::{Request, Response, RestApi};
pub use storage::{FileOptionStore, JsonStorage, MemoryOptionStore, OptionStore, StorageBackend};

#[cfg(feature = "toml")]
pub use storage::TomlStorage;

// Re-exports from config
pub use config::{
    FieldDefinition, FieldOption, FieldType, SettingsConfig, SettingsConfigBuilder, opt,
};

// Re-exports from marketplace
pub use marketplace::{
    DocumentStore, FileDocumentStore, MemoryDocumentStore, Placement, PlacementCatalog, Product,
    ProductInput, ProductService,
};
