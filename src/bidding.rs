//! Header bidding: the global switch and pluggable bidder definitions
//!
//! Bidder integrations register themselves with [`Bidding::register_bidder`].
//! Their settings fields are added to the `bidding` section of the settings
//! registry, and a bidder only becomes available once the field named by its
//! `active_key` holds a truthy value (typically a customer or publisher id).
//!
//! ```rust
//! use adconf::{Bidding, BidderConfig, FieldDefinition, SettingsManager};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let settings = Arc::new(SettingsManager::builder("my-site").in_memory().build()?);
//! let bidding = Bidding::new(Arc::clone(&settings))?;
//!
//! bidding.register_bidder(
//!     "sample_bidder",
//!     BidderConfig::new("Sample Bidder", "sample_bidder_customer_id")
//!         .setting(FieldDefinition::string("", "sample_bidder_customer_id", "")),
//! )?;
//! assert!(bidding.get_bidder("sample_bidder")?.is_none());
//!
//! let values = json!({ "sample_bidder_customer_id": "1234567890" });
//! settings.update_section("bidding", values.as_object().unwrap())?;
//! assert!(bidding.get_bidder("sample_bidder")?.is_some());
//! # Ok::<(), adconf::Error>(())
//! ```

use crate::coerce;
use crate::config::{FieldDefinition, opt};
use crate::error::{Error, Result};
use crate::manager::SettingsManager;
use crate::sync::RwLockExt;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Section holding the header bidding settings and all bidder fields
pub const SETTINGS_SECTION_NAME: &str = "bidding";

/// Definition supplied by a bidder integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidderConfig {
    /// Display name
    pub name: String,

    /// Key of the bidding setting that marks the bidder as configured
    pub active_key: String,

    /// Settings fields of this bidder; their section is forced to `bidding`
    #[serde(default)]
    pub settings: Vec<FieldDefinition>,

    /// Ad sizes the bidder accepts, e.g. `"300x250"` (empty means any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ad_sizes: Vec<String>,
}

impl BidderConfig {
    pub fn new(name: impl Into<String>, active_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active_key: active_key.into(),
            settings: Vec::new(),
            ad_sizes: Vec::new(),
        }
    }

    #[must_use]
    pub fn setting(mut self, field: FieldDefinition) -> Self {
        self.settings.push(field);
        self
    }

    #[must_use]
    pub fn ad_sizes(mut self, sizes: &[&str]) -> Self {
        self.ad_sizes = sizes.iter().map(|s| (*s).to_string()).collect();
        self
    }
}

/// A registered bidder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bidder {
    pub id: String,
    #[serde(flatten)]
    pub config: BidderConfig,
}

/// Header bidding registry
pub struct Bidding {
    settings: Arc<SettingsManager>,
    bidders: RwLock<Vec<Bidder>>,
}

impl Bidding {
    /// Register the header bidding section fields and create an empty registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the section fields cannot be registered.
    pub fn new(settings: Arc<SettingsManager>) -> Result<Self> {
        settings.register_fields(section_fields())?;
        Ok(Self {
            settings,
            bidders: RwLock::new(Vec::new()),
        })
    }

    /// The settings registry this bidding registry writes into
    pub fn settings(&self) -> &Arc<SettingsManager> {
        &self.settings
    }

    /// Register a bidder and its settings fields.
    ///
    /// Re-registering an id replaces the earlier definition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidBidder` if `id` or `active_key` is empty.
    ///
    /// `active_key` may name a field of the `bidding` section registered by
    /// someone else; until such a field exists the bidder stays unavailable.
    pub fn register_bidder(&self, id: &str, config: BidderConfig) -> Result<()> {
        if id.is_empty() {
            return Err(Error::InvalidBidder("bidder id is empty".into()));
        }
        if config.active_key.is_empty() {
            return Err(Error::InvalidBidder(format!("bidder '{id}' has no active key")));
        }

        let mut config = config;
        for field in &mut config.settings {
            field.section = SETTINGS_SECTION_NAME.to_string();
        }
        self.settings.register_fields(config.settings.clone())?;

        let bidder = Bidder {
            id: id.to_string(),
            config,
        };
        let mut bidders = self.bidders.write_recovered();
        if let Some(existing) = bidders.iter_mut().find(|b| b.id == id) {
            *existing = bidder;
        } else {
            bidders.push(bidder);
        }
        info!("Registered bidder '{id}'");
        Ok(())
    }

    /// Ids of all registered bidders, available or not
    pub fn bidder_ids(&self) -> Vec<String> {
        self.bidders
            .read_recovered()
            .iter()
            .map(|b| b.id.clone())
            .collect()
    }

    /// Whether header bidding is switched on
    ///
    /// # Errors
    ///
    /// Returns an error if the bidding section cannot be read.
    pub fn is_active(&self) -> Result<bool> {
        let active = self.settings.get_setting(SETTINGS_SECTION_NAME, "active")?;
        Ok(coerce::to_bool(&active))
    }

    /// The bidder registered as `id`, if its active key is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the bidding section cannot be read.
    pub fn get_bidder(&self, id: &str) -> Result<Option<Bidder>> {
        let Some(bidder) = self
            .bidders
            .read_recovered()
            .iter()
            .find(|b| b.id == id)
            .cloned()
        else {
            return Ok(None);
        };

        let settings = self.settings.get_settings(SETTINGS_SECTION_NAME, false)?;
        if is_available(&bidder, &settings) {
            Ok(Some(bidder))
        } else {
            debug!("Bidder '{id}' is registered but not configured");
            Ok(None)
        }
    }

    /// All available bidders, in registration order.
    ///
    /// Empty while header bidding is switched off.
    ///
    /// # Errors
    ///
    /// Returns an error if the bidding section cannot be read.
    pub fn get_bidders(&self) -> Result<Vec<Bidder>> {
        let settings = self.settings.get_settings(SETTINGS_SECTION_NAME, false)?;
        if !settings.get("active").is_some_and(coerce::to_bool) {
            return Ok(Vec::new());
        }
        Ok(self
            .bidders
            .read_recovered()
            .iter()
            .filter(|b| is_available(b, &settings))
            .cloned()
            .collect())
    }
}

fn is_available(bidder: &Bidder, settings: &serde_json::Map<String, serde_json::Value>) -> bool {
    settings
        .get(&bidder.config.active_key)
        .is_some_and(coerce::to_bool)
}

fn section_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::boolean(SETTINGS_SECTION_NAME, "active", false)
            .description("Header bidding")
            .help("Connect to bidding partners through Prebid.js"),
        FieldDefinition::select(
            SETTINGS_SECTION_NAME,
            "price_granularity",
            "dense",
            vec![
                opt("low", "Low"),
                opt("medium", "Medium"),
                opt("high", "High"),
                opt("auto", "Auto"),
                opt("dense", "Dense"),
            ],
        )
        .description("Price granularity")
        .help("Price bucket increments for header bidding line items"),
        FieldDefinition::array(SETTINGS_SECTION_NAME, "enabled_bidders", &[])
            .description("Enabled bidders")
            .help("Ids of the bidders the site works with"),
    ]
}
